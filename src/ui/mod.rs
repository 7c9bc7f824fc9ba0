pub mod icons;
pub mod progress;
pub mod surface;

pub use progress::AnalysisUi;
pub use surface::TerminalSurface;
