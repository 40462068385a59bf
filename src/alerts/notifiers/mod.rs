// Alert sink implementations
pub mod desktop;
pub mod browser;
pub mod discord;

pub use desktop::DesktopNotifier;
pub use browser::BrowserLauncher;
pub use discord::DiscordNotifier;
