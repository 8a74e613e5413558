pub mod chart_service;
pub mod overlay_service;
pub mod request_service;
pub mod series_service;
