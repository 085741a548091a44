mod app;
mod config;
mod logging;
mod query;
mod storage;
mod surface;
mod wiki;

fn main() {
    console_error_panic_hook::set_once();
    logging::init();
    app::boot();
}
