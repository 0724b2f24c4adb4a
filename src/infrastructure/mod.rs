//! 基础设施层
//!
//! 页面脚本、JS 执行器，以及业务层依赖的页面抽象

pub mod js_executor;
pub mod page;
pub mod scripts;

pub use js_executor::JsExecutor;
pub use page::{eval_as, BrowserPage, SessionFactory};
pub use scripts::{GridQuery, PageScript};
