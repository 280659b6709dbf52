// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod category;
pub mod formation;
pub mod inscription;
pub mod payment;
pub mod user;

pub use activity::ActivityEntry;
pub use category::Category;
pub use formation::{Formation, FormationStatus};
pub use inscription::{
    CourseChoice, DeliveryMode, FundingDetails, Inscription, InscriptionStatus, PersonalInfo,
};
pub use payment::Payment;
pub use user::{Role, UserProfile};
