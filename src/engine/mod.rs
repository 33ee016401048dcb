// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accounts;
pub mod aggregation;
pub mod budgets;
pub mod categories;
pub mod investments;
pub mod securities;
pub mod snapshots;
pub mod transactions;
