pub mod config;
pub mod error;
pub mod events;
pub mod gallery;
pub mod probe;
pub mod sequence;
pub mod surface;
pub mod testkit;
pub mod tasks {
    pub mod frames;
    pub mod loop_gallery;
    pub mod one_shot_gallery;
    pub mod scroll_gallery;
    pub mod sticky;
}
