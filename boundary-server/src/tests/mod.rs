//! Shared test harness modules for the boundary CLI.

use super::*;

mod helpers;
