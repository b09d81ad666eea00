// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Risk Rules
//!
//! spec.md §4.7: each rule is a pure function from pre-aggregated inputs
//! (computed by the infrastructure layer from corridor/lane/profile
//! tables) to an optional [`RiskReason`]. [`RiskOpinion::from_reasons`]
//! folds the outputs of whichever rules fired into one composite opinion.

use crate::entities::risk_opinion::RiskReason;
use serde_json::json;

const FREE_EMAIL_DOMAINS: &[&str] =
    &["gmail.com", "yahoo.com", "hotmail.com", "outlook.com", "aol.com", "protonmail.com", "mail.com", "gmx.com"];

fn severity_for_invoice_z(abs_z: f64) -> &'static str {
    if abs_z >= 5.0 {
        "CRITICAL"
    } else if abs_z >= 3.0 {
        "HIGH"
    } else {
        "MEDIUM"
    }
}

/// `z = (price - corridor.median) / corridor.std`. Fires for `z <= -2`.
pub fn under_invoice(price_usd_per_kg: f64, corridor_median: f64, corridor_std: f64) -> Option<RiskReason> {
    if corridor_std <= 0.0 {
        return None;
    }
    let z = (price_usd_per_kg - corridor_median) / corridor_std;
    if z > -2.0 {
        return None;
    }
    let score = (50.0 + (10.0 * z.abs()).min(40.0)).min(100.0);
    Some(RiskReason {
        code: "UNDER_INVOICE".to_string(),
        score,
        severity: severity_for_invoice_z(z.abs()).to_string(),
        context: json!({ "z_score": z, "corridor_median": corridor_median, "corridor_std": corridor_std }),
    })
}

/// Symmetric counterpart of [`under_invoice`]; fires for `z >= +2`.
pub fn over_invoice(price_usd_per_kg: f64, corridor_median: f64, corridor_std: f64) -> Option<RiskReason> {
    if corridor_std <= 0.0 {
        return None;
    }
    let z = (price_usd_per_kg - corridor_median) / corridor_std;
    if z < 2.0 {
        return None;
    }
    let score = (50.0 + (10.0 * z.abs()).min(40.0)).min(100.0);
    Some(RiskReason {
        code: "OVER_INVOICE".to_string(),
        score,
        severity: severity_for_invoice_z(z.abs()).to_string(),
        context: json!({ "z_score": z, "corridor_median": corridor_median, "corridor_std": corridor_std }),
    })
}

/// Fires when a lane is near-unique for its HS6 category in the global
/// population: `lane_shipment_count <= 3` while `hs6_global_count >= 50`.
pub fn weird_lane(lane_shipment_count: u64, hs6_global_count: u64) -> Option<RiskReason> {
    if lane_shipment_count > 3 || hs6_global_count < 50 {
        return None;
    }
    // Rarer lanes within a large global population score higher.
    let rarity = 1.0 - (lane_shipment_count as f64 / 4.0);
    let score = 40.0 + rarity * 20.0;
    Some(RiskReason {
        code: "WEIRD_LANE".to_string(),
        score,
        severity: "MEDIUM".to_string(),
        context: json!({ "lane_shipment_count": lane_shipment_count, "hs6_global_count": hs6_global_count }),
    })
}

/// Fires for a high-value buyer with no corroborating web presence.
pub fn ghost_entity(total_value_usd: f64, has_website_signal: bool) -> Option<RiskReason> {
    if total_value_usd < 500_000.0 || has_website_signal {
        return None;
    }
    let excess_ratio = (total_value_usd / 500_000.0).min(3.0);
    let score = 45.0 + (excess_ratio - 1.0) * 12.5; // 45 at threshold, up to 70 at 3x
    Some(RiskReason {
        code: "GHOST_ENTITY".to_string(),
        score: score.min(70.0),
        severity: "HIGH".to_string(),
        context: json!({ "total_value_usd": total_value_usd, "has_website_signal": has_website_signal }),
    })
}

/// Fires when a buyer's monthly shipment count is anomalously high,
/// either by z-score against its own trailing history or by a sharp
/// month-over-month jump.
pub fn volume_spike(monthly_count_z_score: f64, month_over_month_pct_change: f64) -> Option<RiskReason> {
    let z_trigger = monthly_count_z_score > 2.0;
    let mom_trigger = month_over_month_pct_change >= 2.0;
    if !z_trigger && !mom_trigger {
        return None;
    }
    let magnitude = monthly_count_z_score.max(month_over_month_pct_change);
    let score = (30.0 + (magnitude * 10.0)).clamp(30.0, 70.0);
    Some(RiskReason {
        code: "VOLUME_SPIKE".to_string(),
        score,
        severity: "MEDIUM".to_string(),
        context: json!({ "monthly_count_z_score": monthly_count_z_score, "month_over_month_pct_change": month_over_month_pct_change }),
    })
}

/// Fires when a high-volume buyer's observed contact domains are all
/// free webmail. `contact_email_domains` may contain duplicates; an
/// empty list never fires (nothing observed).
pub fn free_email(is_high_volume: bool, contact_email_domains: &[String]) -> Option<RiskReason> {
    if !is_high_volume || contact_email_domains.is_empty() {
        return None;
    }
    let all_free = contact_email_domains.iter().all(|d| FREE_EMAIL_DOMAINS.contains(&d.to_lowercase().as_str()));
    if !all_free {
        return None;
    }
    Some(RiskReason {
        code: "FREE_EMAIL".to_string(),
        score: 35.0,
        severity: "LOW".to_string(),
        context: json!({ "contact_email_domains": contact_email_domains }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_e_under_invoice_is_critical() {
        // corridor median 7.0, std 1.5, price 0.57 -> z = (0.57-7.0)/1.5 = -4.29
        let reason = under_invoice(0.57, 7.0, 1.5).unwrap();
        assert_eq!(reason.code, "UNDER_INVOICE");
        assert_eq!(reason.severity, "HIGH");
    }

    #[test]
    fn under_invoice_does_not_fire_within_band() {
        assert!(under_invoice(6.9, 7.0, 1.5).is_none());
    }

    #[test]
    fn over_invoice_symmetric() {
        let reason = over_invoice(20.0, 7.0, 1.5).unwrap();
        assert_eq!(reason.code, "OVER_INVOICE");
    }

    #[test]
    fn weird_lane_requires_both_thresholds() {
        assert!(weird_lane(2, 50).is_some());
        assert!(weird_lane(5, 50).is_none());
        assert!(weird_lane(2, 10).is_none());
    }

    #[test]
    fn ghost_entity_requires_no_website() {
        assert!(ghost_entity(600_000.0, false).is_some());
        assert!(ghost_entity(600_000.0, true).is_none());
        assert!(ghost_entity(400_000.0, false).is_none());
    }

    #[test]
    fn free_email_requires_all_domains_free() {
        let domains = vec!["gmail.com".to_string(), "yahoo.com".to_string()];
        assert!(free_email(true, &domains).is_some());
        let mixed = vec!["gmail.com".to_string(), "acme-corp.com".to_string()];
        assert!(free_email(true, &mixed).is_none());
    }
}
