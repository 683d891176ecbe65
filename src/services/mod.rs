// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

pub mod auth_middleware;
pub mod backup;
pub mod db;
pub mod extract;
pub mod fetcher;
pub mod geocode;
pub mod hubspot;
pub mod logging;
pub mod partner_db;
pub mod partner_scanner;
pub mod product_db;
pub mod rackbeat;
pub mod schedule;
pub mod site_crawler;
