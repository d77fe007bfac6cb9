use crate::element_id::hit_zone_element_id;
use crate::registry::PieceIndex;
use crate::surface::PuzzleSurface;

/// Gives every target an enlarged, near-invisible capture rectangle so thin or
/// small tray shapes stay easy to grab on touch screens.
///
/// An existing `rt<n>` is reused instead of inserting a second one. Targets
/// without bounds are skipped. Returns how many pieces ended up with a zone.
pub fn synthesize_hit_zones<S>(
    surface: &mut S,
    index: &mut PieceIndex<S::Node>,
    padding: f32,
    opacity: f32,
) -> usize
where
    S: PuzzleSurface,
{
    let pending: Vec<_> = index
        .iter()
        .filter_map(|slots| slots.target.clone().map(|target| (slots.id, target)))
        .collect();
    let mut created = 0;
    for (id, target) in pending {
        let zone_id = hit_zone_element_id(id);
        let zone = match surface.find(&zone_id) {
            Some(existing) => Some(existing),
            None => surface
                .bounding_box(&target)
                .map(|bbox| bbox.expand(padding))
                .and_then(|rect| surface.insert_hit_zone(&target, &zone_id, rect, opacity)),
        };
        if let Some(zone) = zone {
            index.set_hit_zone(id, zone);
            created += 1;
        }
    }
    created
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BBox;
    use crate::scene::SvgScene;

    #[test]
    fn zone_is_padded_lowest_child_and_not_duplicated() {
        let mut scene = SvgScene::new();
        scene.add_group("g1", BBox::new(0.0, 0.0, 10.0, 10.0));
        let target = scene.add_group("t1", BBox::new(100.0, 100.0, 2.0, 30.0));
        scene.add_child(target, None, BBox::new(100.0, 100.0, 2.0, 30.0));

        let mut index = PieceIndex::scan(&scene);
        assert_eq!(synthesize_hit_zones(&mut scene, &mut index, 10.0, 0.01), 1);
        let zone = scene.node_by_id("rt1").expect("zone inserted");
        assert_eq!(scene.children_of(target).first(), Some(&zone));
        assert_eq!(
            scene.bounding_box(&zone),
            Some(BBox::new(90.0, 90.0, 22.0, 50.0))
        );
        assert!(scene.opacity(zone).is_some_and(|opacity| opacity > 0.0));

        let mut index = PieceIndex::scan(&scene);
        synthesize_hit_zones(&mut scene, &mut index, 10.0, 0.01);
        assert_eq!(scene.hit_zone_count(), 1);
    }
}
