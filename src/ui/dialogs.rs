use rfd::FileDialog;
use std::path::PathBuf;

/// File dialog helper for Track-Viz
pub struct FileDialogs;

impl FileDialogs {
    /// Open a file dialog for selecting a track CSV
    pub fn open_track_file() -> Option<PathBuf> {
        FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .add_filter("All Files", &["*"])
            .set_title("Open GPS Track")
            .pick_file()
    }
}
