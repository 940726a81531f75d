/// Data layer: fetching, normalizing, caching, filtering and summarising.
///
/// Architecture:
/// ```text
///  spreadsheet values API / CSV snapshot
///        │
///        ▼
///   ┌──────────┐
///   │ fetcher   │  sheet rows → raw Table   (auth: service-account token)
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ normalize │  drop blank rows, coerce year columns
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  cache    │  one Table, refetched lazily after the ttl
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐      ┌──────────┐
///   │  filter   │ ───▶ │ summary   │  grouped counts for the charts
///   └──────────┘      └──────────┘
/// ```

pub mod auth;
pub mod cache;
pub mod fetcher;
pub mod filter;
pub mod model;
pub mod normalize;
pub mod summary;
