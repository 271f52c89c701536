//! [reqwest] transport for cashew.
//!
//! [`ReqwestSender`] implements [`cashew_http::Sender`], so it can be wrapped
//! by `cashew::CachingSender` or `cashew::CachingExtractor`:
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use cashew::CachingSender;
//! use cashew_http::HttpRequest;
//! use cashew_moka::MokaCache;
//! use cashew_reqwest::{ReqwestSender, SenderConfig};
//!
//! let sender = ReqwestSender::new(SenderConfig::new("https://api.example.com").accept("application/json"))?;
//! let client = CachingSender::new(sender, MokaCache::builder().max_entries(1_000).build());
//!
//! let quotes = client.execute(&HttpRequest::get("/quotes").param("symbol", "ACME")).await?;
//! println!("{} ({})", quotes.value.text(), quotes.status);
//! # Ok(())
//! # }
//! ```
mod config;
mod sender;

pub use config::SenderConfig;
pub use sender::ReqwestSender;
