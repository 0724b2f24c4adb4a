pub mod chrome_page;
pub mod launcher;

pub use chrome_page::{ChromePage, ChromeSessionFactory};
pub use launcher::launch_browser;
