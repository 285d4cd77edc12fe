mod settings;

pub use settings::{Config, PtySettings, Settings, TimingSettings};
