pub mod post_api;
