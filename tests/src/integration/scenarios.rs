//! # Lifecycle Scenarios
//!
//! End-to-end runs through the named-function handler against one shared
//! in-memory ledger:
//!
//! 1. **A**: initiate, assign, accept
//! 2. **B**: main awardee reimbursement within the category allocation
//! 3. **C**: sub awardee request above the sub ceiling, then above what
//!    the main awardee left of the allocation
//! 4. **D**: accept, redeem, cash out
//! 5. **E**: revocation blocks every further workflow step

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use grant_contract::algorithms::budget::Commitments;
    use grant_contract::domain::invariants::check_all_invariants;
    use grant_contract::ipc::payloads::tags;
    use grant_contract::{Amount, AwardeeType, GrantStatus, PaymentStatus};
    use serde_json::json;

    // =============================================================================
    // SCENARIO A: GRANT LIFECYCLE
    // =============================================================================

    #[test]
    fn test_scenario_a_grant_reaches_approved() {
        let h = Harness::new();

        let r = h.call(
            GRANTOR,
            GRANTOR_MSP,
            "InitiateGrant",
            &[],
            payload(
                tags::GRANT,
                grant_body("G-1", 10_000, &[("Travel", 6000), ("Equipment", 4000)], 50),
            ),
        );
        assert!(r.success, "{}", r.message);
        assert_eq!(r.payload["status"], "Not Assigned");
        assert_eq!(r.payload["grantor_id"], GRANTOR);

        let r = h.call(
            GRANTOR,
            GRANTOR_MSP,
            "AssignGrant",
            &[],
            payload(
                tags::ASSIGN_GRANT,
                json!({"grant_id": "G-1", "awardee": [awardee_body("A1", AWARDEE_MSP)]}),
            ),
        );
        assert!(r.success, "{}", r.message);
        assert_eq!(h.grant("G-1").map(|g| g.status), Some(GrantStatus::Pending));

        let r = h.call_plain("A1", AWARDEE_MSP, "AcceptGrant", &["G-1"]);
        assert!(r.success, "{}", r.message);

        let grant = h.grant("G-1").expect("grant stored");
        assert_eq!(grant.status, GrantStatus::Approved);
        assert_eq!(grant.awardees.len(), 1);
        assert_eq!(grant.awardees[0].organization, "Awardee");
    }

    #[test]
    fn test_benefit_mismatch_is_not_stored() {
        let h = Harness::new();
        let r = h.call(
            GRANTOR,
            GRANTOR_MSP,
            "InitiateGrant",
            &[],
            payload(
                tags::GRANT,
                grant_body("G-2", 10_000, &[("Travel", 6000), ("Equipment", 3000)], 50),
            ),
        );
        assert!(!r.success);
        assert_eq!(r.error_kind.as_deref(), Some("validation_failed"));
        assert!(r.message.contains("doesn't match"));
        assert!(h.grant("G-2").is_none());
    }

    #[test]
    fn test_only_main_awardee_answers() {
        let h = Harness::new();
        h.call(
            GRANTOR,
            GRANTOR_MSP,
            "InitiateGrant",
            &[],
            payload(tags::GRANT, grant_body("G-1", 100, &[("Travel", 100)], 10)),
        );
        h.call(
            GRANTOR,
            GRANTOR_MSP,
            "AssignGrant",
            &[],
            payload(
                tags::ASSIGN_GRANT,
                json!({"grant_id": "G-1", "awardee": [awardee_body("A1", AWARDEE_MSP)]}),
            ),
        );

        let r = h.call_plain("A2", AWARDEE_MSP, "AcceptGrant", &["G-1"]);
        assert_eq!(r.error_kind.as_deref(), Some("authorization_denied"));

        let r = h.call_plain("A1", AWARDEE_MSP, "RejectGrant", &["G-1"]);
        assert!(r.success, "{}", r.message);

        let r = h.call_plain("A1", AWARDEE_MSP, "AcceptGrant", &["G-1"]);
        assert_eq!(r.error_kind.as_deref(), Some("invalid_state"));
        assert_eq!(h.grant("G-1").map(|g| g.status), Some(GrantStatus::Rejected));
    }

    // =============================================================================
    // SCENARIOS B AND C: ADMISSION
    // =============================================================================

    #[test]
    fn test_scenario_b_main_request_admitted() {
        let h = Harness::new();
        approved_grant(&h);

        let r = request(&h, "A1", AWARDEE_MSP, "P-1", &[("Travel", 5000)]);
        assert!(r.success, "{}", r.message);
        assert_eq!(
            r.message,
            "Reimbursement Request for the Payment P-1 is successful"
        );
        assert_eq!(r.payload["status"], "Requested");
        assert_eq!(r.payload["total"], 5000);
        assert_eq!(r.payload["date"], "03-14-2026 09:26:53");

        let grant = h.grant("G-1").expect("grant stored");
        assert_eq!(grant.payments.len(), 1);
        assert_eq!(grant.payments[0].status, PaymentStatus::Requested);
    }

    #[test]
    fn test_scenario_c_sub_request_over_ceiling() {
        let h = Harness::new();
        approved_grant(&h);
        assert!(request(&h, "A1", AWARDEE_MSP, "P-1", &[("Travel", 5000)]).success);

        let r = add_subawardee(&h, "S1");
        assert!(r.success, "{}", r.message);

        let r = request(&h, "S1", SUBAWARDEE_MSP, "P-2", &[("Travel", 3500)]);
        assert!(!r.success);
        assert_eq!(r.error_kind.as_deref(), Some("validation_failed"));
        assert!(r.message.contains("remaining 3000"), "{}", r.message);
        assert!(r.message.contains("Travel"));

        assert_eq!(h.grant("G-1").map(|g| g.payments.len()), Some(1));

        // within the sub ceiling, but A1 already holds 5000 of the 6000
        let r = request(&h, "S1", SUBAWARDEE_MSP, "P-2", &[("Travel", 3000)]);
        assert_eq!(r.error_kind.as_deref(), Some("validation_failed"));
        assert!(r.message.contains("allocated amount of 6000"), "{}", r.message);
        assert!(r.message.contains("remaining 1000"), "{}", r.message);

        let r = request(&h, "S1", SUBAWARDEE_MSP, "P-2", &[("Travel", 1000)]);
        assert!(r.success, "{}", r.message);
        assert_eq!(h.grant("G-1").map(|g| g.payments.len()), Some(2));

        let r = request(&h, "A1", AWARDEE_MSP, "P-3", &[("Travel", 1)]);
        assert_eq!(r.error_kind.as_deref(), Some("validation_failed"));
    }

    #[test]
    fn test_promoting_subawardee_keeps_allocation() {
        let h = Harness::new();
        approved_grant(&h);
        assert!(add_subawardee(&h, "S1").success);
        assert!(request(&h, "A1", AWARDEE_MSP, "P-1", &[("Travel", 5000)]).success);
        assert!(request(&h, "S1", SUBAWARDEE_MSP, "P-2", &[("Travel", 1000)]).success);

        // S1 joins the main roster; its payment now counts as main usage
        let r = h.call(
            GRANTOR,
            GRANTOR_MSP,
            "AddAwardee",
            &[],
            payload(
                tags::ADD_AWARDEE,
                json!({"grant_id": "G-1", "awardee": awardee_body("S1", AWARDEE_MSP)}),
            ),
        );
        assert!(r.success, "{}", r.message);

        let grant = h.grant("G-1").expect("grant stored");
        assert!(check_all_invariants(None, &grant).is_valid());
        let commitments = Commitments::from_grant(&grant).expect("amounts fit");
        assert_eq!(commitments.committed("Travel", AwardeeType::Main), Amount::new(6000));
        assert_eq!(commitments.committed("Travel", AwardeeType::Sub), Amount::ZERO);
    }

    #[test]
    fn test_sub_headroom_within_category() {
        let h = Harness::new();
        approved_grant(&h);
        assert!(add_subawardee(&h, "S1").success);

        assert!(request(&h, "S1", SUBAWARDEE_MSP, "P-1", &[("Equipment", 1500)]).success);
        let r = request(&h, "S1", SUBAWARDEE_MSP, "P-2", &[("Equipment", 600)]);
        assert!(r.message.contains("remaining 500"), "{}", r.message);
        assert!(request(&h, "S1", SUBAWARDEE_MSP, "P-3", &[("Equipment", 500)]).success);
    }

    #[test]
    fn test_duplicate_payment_id() {
        let h = Harness::new();
        approved_grant(&h);
        assert!(request(&h, "A1", AWARDEE_MSP, "P-1", &[("Travel", 100)]).success);

        let r = request(&h, "A1", AWARDEE_MSP, "P-1", &[("Equipment", 100)]);
        assert_eq!(r.error_kind.as_deref(), Some("duplicate"));
        assert_eq!(h.grant("G-1").map(|g| g.payments.len()), Some(1));
    }

    #[test]
    fn test_rejection_releases_budget() {
        let h = Harness::new();
        approved_grant(&h);
        assert!(request(&h, "A1", AWARDEE_MSP, "P-1", &[("Travel", 6000)]).success);
        assert!(!request(&h, "A1", AWARDEE_MSP, "P-2", &[("Travel", 1)]).success);

        let r = h.call_plain(
            GRANTOR,
            GRANTOR_MSP,
            "RejectReimbursement",
            &["G-1", "P-1", "receipts missing"],
        );
        assert!(r.success, "{}", r.message);
        assert_eq!(r.payload["status"], "receipts missing");

        assert!(request(&h, "A1", AWARDEE_MSP, "P-2", &[("Travel", 6000)]).success);
    }

    #[test]
    fn test_workflow_label_is_not_a_reason() {
        let h = Harness::new();
        approved_grant(&h);
        assert!(request(&h, "A1", AWARDEE_MSP, "P-1", &[("Travel", 10)]).success);

        for reason in ["Accepted", "   "] {
            let r = h.call_plain(GRANTOR, GRANTOR_MSP, "RejectReimbursement", &["G-1", "P-1", reason]);
            assert_eq!(r.error_kind.as_deref(), Some("validation_failed"), "{reason:?}");
        }
        let grant = h.grant("G-1").expect("grant stored");
        assert_eq!(grant.payments[0].status, PaymentStatus::Requested);
    }

    // =============================================================================
    // SCENARIO D: ACCEPT, REDEEM, CASH OUT
    // =============================================================================

    #[test]
    fn test_scenario_d_cash_out() {
        let h = Harness::new();
        approved_grant(&h);
        assert!(request(&h, "A1", AWARDEE_MSP, "P-1", &[("Travel", 5000)]).success);

        let r = h.call_plain(GRANTOR, GRANTOR_MSP, "AcceptReimbursement", &["G-1", "P-1"]);
        assert!(r.success, "{}", r.message);
        assert_eq!(r.payload["status"], "Accepted");
        assert_eq!(h.grant("G-1").map(|g| g.paid_amount), Some(Amount::new(5000)));

        let r = h.call_plain("A1", AWARDEE_MSP, "MyWallet", &["G-1"]);
        assert_eq!(r.payload["requestedAmount"], 5000);
        assert_eq!(r.payload["cashedOut"], 0);

        let r = h.call_plain("A1", AWARDEE_MSP, "RedeemTokens", &["G-1", "P-1"]);
        assert!(r.success, "{}", r.message);
        assert_eq!(r.payload["status"], "Pending-redeem");

        let r = h.call_plain(GRANTOR, GRANTOR_MSP, "AcceptRedeem", &["G-1", "P-1"]);
        assert!(r.success, "{}", r.message);

        let grant = h.grant("G-1").expect("grant stored");
        assert_eq!(grant.payments[0].status, PaymentStatus::AcceptedRedeem);
        assert_eq!(grant.cashed_out, Amount::new(5000));
        assert_eq!(grant.paid_amount, Amount::ZERO);

        let r = h.call_plain("A1", AWARDEE_MSP, "MyWallet", &["G-1"]);
        assert_eq!(r.payload["cashedOut"], 5000);
        assert_eq!(r.payload["requestedAmount"], 0);

        let r = h.call_plain(GRANTOR, GRANTOR_MSP, "GetRemainingAmount", &["G-1"]);
        assert_eq!(r.payload, json!(5000));
    }

    #[test]
    fn test_redeem_only_by_payment_owner() {
        let h = Harness::new();
        approved_grant(&h);
        assert!(add_subawardee(&h, "S1").success);
        assert!(request(&h, "A1", AWARDEE_MSP, "P-1", &[("Travel", 50)]).success);
        assert!(h.call_plain(GRANTOR, GRANTOR_MSP, "AcceptReimbursement", &["G-1", "P-1"]).success);

        let r = h.call_plain("S1", SUBAWARDEE_MSP, "RedeemTokens", &["G-1", "P-1"]);
        assert_eq!(r.error_kind.as_deref(), Some("authorization_denied"));
    }

    #[test]
    fn test_out_of_order_payment_event() {
        let h = Harness::new();
        approved_grant(&h);
        assert!(request(&h, "A1", AWARDEE_MSP, "P-1", &[("Travel", 50)]).success);

        let r = h.call_plain(GRANTOR, GRANTOR_MSP, "AcceptRedeem", &["G-1", "P-1"]);
        assert_eq!(r.error_kind.as_deref(), Some("invalid_state"));

        let r = h.call_plain(GRANTOR, GRANTOR_MSP, "AcceptReimbursement", &["G-1", "P-9"]);
        assert_eq!(r.error_kind.as_deref(), Some("not_found"));
    }

    // =============================================================================
    // SCENARIO E: REVOCATION
    // =============================================================================

    #[test]
    fn test_scenario_e_revoked_grant_is_frozen() {
        let h = Harness::new();
        approved_grant(&h);
        assert!(request(&h, "A1", AWARDEE_MSP, "P-1", &[("Travel", 100)]).success);

        let r = h.call_plain(GRANTOR, GRANTOR_MSP, "RevokeGrant", &["G-1"]);
        assert!(r.success, "{}", r.message);

        let r = h.call(
            "A1",
            AWARDEE_MSP,
            "AddProgress",
            &[],
            payload(
                tags::ADD_PROGRESS,
                json!({"grant_id": "G-1", "progress": {"notes": "fieldwork", "percentage": "40"}}),
            ),
        );
        assert_eq!(r.error_kind.as_deref(), Some("invalid_state"), "{}", r.message);

        let r = request(&h, "A1", AWARDEE_MSP, "P-2", &[("Travel", 100)]);
        assert_eq!(r.error_kind.as_deref(), Some("invalid_state"), "{}", r.message);

        let r = h.call_plain("A1", AWARDEE_MSP, "AcceptGrant", &["G-1"]);
        assert_eq!(r.error_kind.as_deref(), Some("invalid_state"), "{}", r.message);

        let r = h.call_plain(GRANTOR, GRANTOR_MSP, "AcceptReimbursement", &["G-1", "P-1"]);
        assert_eq!(r.error_kind.as_deref(), Some("invalid_state"), "{}", r.message);

        let r = h.call_plain("A1", AWARDEE_MSP, "MyWallet", &["G-1"]);
        assert_eq!(r.error_kind.as_deref(), Some("invalid_state"));

        let grant = h.grant("G-1").expect("grant stored");
        assert_eq!(grant.status, GrantStatus::Revoked);
        assert!(grant.progress.is_empty());
        assert_eq!(grant.payments.len(), 1);
    }

    #[test]
    fn test_progress_recorded_on_approved_grant() {
        let h = Harness::new();
        approved_grant(&h);
        assert!(add_subawardee(&h, "S1").success);

        let r = h.call(
            "S1",
            SUBAWARDEE_MSP,
            "AddProgress",
            &[],
            payload(
                tags::ADD_PROGRESS,
                json!({"grant_id": "G-1", "progress": {"notes": "samples collected", "percentage": "25"}}),
            ),
        );
        assert!(r.success, "{}", r.message);

        let r = h.call_plain("A1", AWARDEE_MSP, "GetProgress", &["G-1"]);
        assert_eq!(r.payload[0]["notes"], "samples collected");
    }
}
