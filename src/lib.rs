// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Galatea — live shared canvas (element store + MCP + browser viewers).
//!
//! One mutable canvas, three surfaces: MCP tools for an AI agent, REST for
//! the browser client, and a WebSocket push channel for viewers. The store
//! in [`store`] is the single source of truth; everything else adapts it to
//! a transport.

pub mod api;
pub mod broadcast;
pub mod mcp;
pub mod model;
pub mod ops;
pub mod protocol;
pub mod server;
pub mod store;
