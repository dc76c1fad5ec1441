pub mod config;
pub mod domain;
pub mod export;
pub mod extract;
pub mod fetch;
pub mod output;
pub mod page;
pub mod scrape;

#[cfg(test)]
mod test_server;
