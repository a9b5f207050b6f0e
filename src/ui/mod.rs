pub mod html;
pub mod text;
pub mod view;

pub use html::generate_html_report;
pub use text::render_text;
pub use view::{render, InputForm, View};
