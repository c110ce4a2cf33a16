// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod chromium_renderer;
pub mod image_fetcher;
pub mod render_limiter;
pub mod traits;
