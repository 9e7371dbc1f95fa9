pub mod call;
pub mod credential;
pub mod engagement;
pub mod post;
