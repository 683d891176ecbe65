// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

pub mod crawler;
pub mod forms;
pub mod geocode;
pub mod lot;
pub mod media;
pub mod partner;
pub mod product;
pub mod version;
