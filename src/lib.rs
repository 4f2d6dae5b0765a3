pub mod app;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod events;
pub mod form;
pub mod history;
pub mod playlist;
pub mod tasks {
    pub mod fetcher;
    pub mod slideshow;
    pub mod viewer;
}
