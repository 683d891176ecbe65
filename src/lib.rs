// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Backend for the company website: product and partner catalog API, form
//! forwarding to the CRM, ERP lot sync, database backups and the partner
//! website keyword crawler.

pub mod app;
pub mod models;
pub mod routes;
pub mod services;
