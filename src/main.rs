mod app_router;
mod boot;
mod catalog_fetch;
mod dom_surface;
mod input;
mod local_store;
mod play_view;

fn main() {
    console_error_panic_hook::set_once();
    play_view::run();
}
