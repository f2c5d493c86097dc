pub mod assets;
pub mod builder;
pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod format;
pub mod page;
pub mod pdf;
pub mod render;
pub mod report;
pub mod section;
pub mod viewer;

pub use assets::AssetManager;
pub use builder::{FooterConfig, HeaderConfig, PageLayout, ReportBuilder, ReportLayout};
pub use config::{Orientation, PageSize, Settings};
pub use context::RenderContext;
pub use document::{
    create_delivery_note, create_invoice, create_quote, create_receipt, BaseDocument, Document,
    Party, TemplateSource,
};
pub use error::{ReportError, Result};
pub use format::FormatRegistry;
pub use page::{InlineSection, Page};
pub use report::Report;
pub use section::{Footer, Header, Kpi, KpiChange, Kpis, Section, SectionKind, Table, Text};
