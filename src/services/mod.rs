// Services
// Supporting functionality: clocks and settings.

pub mod clock;
pub mod settings_engine;
