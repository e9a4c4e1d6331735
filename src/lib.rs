//! 电影 API 网关
//! 认证、按路由授权，以及受保护的电影目录

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod repository;
pub mod routes;
pub mod services;
pub mod telemetry;
