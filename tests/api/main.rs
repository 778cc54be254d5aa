mod document;
mod health_check;
mod helpers;
mod verification;
