//! # Named-Function Boundary
//!
//! Query functions, argument formats, read policies, configuration loading and
//! the metrics exposed while invocations run.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use grant_contract::ipc::payloads::tags;
    use grant_contract::{ConfigFile, ContractConfig, QueryPolicy};
    use serde_json::json;
    use std::io::Write;

    /// G-1 with A1 and S1, one accepted, one requested and one rejected payment.
    fn busy_grant(h: &Harness) {
        approved_grant(h);
        assert!(add_subawardee(h, "S1").success);
        assert!(request(h, "A1", AWARDEE_MSP, "P-1", &[("Travel", 1200)]).success);
        assert!(request(h, "A1", AWARDEE_MSP, "P-2", &[("Equipment", 300)]).success);
        assert!(request(h, "S1", SUBAWARDEE_MSP, "P-3", &[("Travel", 50), ("Equipment", 25)]).success);
        assert!(h.call_plain(GRANTOR, GRANTOR_MSP, "AcceptReimbursement", &["G-1", "P-1"]).success);
        assert!(h
            .call_plain(GRANTOR, GRANTOR_MSP, "RejectReimbursement", &["G-1", "P-3", "duplicate claim"])
            .success);
    }

    #[test]
    fn test_init_ledger() {
        let h = Harness::new();
        let r = h.call_plain(GRANTOR, GRANTOR_MSP, "InitLedger", &[]);
        assert!(r.success);
        assert_eq!(r.message, "Research grant ledger is initiated");
        assert!(h.ledger.is_empty().expect("ledger readable"));
    }

    #[test]
    fn test_single_grant_queries() {
        let h = Harness::new();
        busy_grant(&h);

        let r = h.call_plain("A1", AWARDEE_MSP, "ReadGrant", &["G-1"]);
        assert!(r.success, "{}", r.message);
        assert_eq!(r.payload["ID"], "G-1");
        assert_eq!(r.payload["awardee"].as_array().map(Vec::len), Some(2));

        let r = h.call_plain("S1", SUBAWARDEE_MSP, "GetGrantBenefits", &["G-1"]);
        assert_eq!(
            r.payload,
            json!([
                {"benefit": "Travel", "amount": 6000},
                {"benefit": "Equipment", "amount": 4000}
            ])
        );

        let r = h.call_plain(GRANTOR, GRANTOR_MSP, "GetPayments", &["G-1"]);
        assert_eq!(r.payload.as_array().map(Vec::len), Some(3));

        let r = h.call_plain(GRANTOR, GRANTOR_MSP, "GetProgress", &["G-1"]);
        assert_eq!(r.payload, json!([]));

        let r = h.call_plain(GRANTOR, GRANTOR_MSP, "GetPaymentByAwardee", &["G-1", "S1"]);
        assert_eq!(r.payload[0]["ID"], "P-3");
        assert_eq!(r.payload[0]["status"], "duplicate claim");

        let r = h.call_plain(GRANTOR, GRANTOR_MSP, "GetPaymentByAwardee", &["G-1", "Z9"]);
        assert_eq!(r.error_kind.as_deref(), Some("not_found"));
    }

    #[test]
    fn test_wallet_queries() {
        let h = Harness::new();
        busy_grant(&h);

        let r = h.call_plain(GRANTOR, GRANTOR_MSP, "GetWallet", &["G-1", "A1", "Accepted"]);
        assert_eq!(r.payload, json!(1200));
        let r = h.call_plain(GRANTOR, GRANTOR_MSP, "GetWallet", &["G-1", "S1", "Rejected"]);
        assert_eq!(r.payload, json!(75));
        let r = h.call_plain(GRANTOR, GRANTOR_MSP, "GetWallet", &["G-1", "A1", "Accept_redeem"]);
        assert_eq!(r.payload, json!(0));

        let r = h.call_plain("S1", SUBAWARDEE_MSP, "MyWallet", &["G-1"]);
        assert_eq!(r.payload, json!({"cashedOut": 0, "requestedAmount": 0}));

        let r = h.call_plain(GRANTOR, GRANTOR_MSP, "MyWallet", &["G-1"]);
        assert_eq!(r.error_kind.as_deref(), Some("authorization_denied"));

        let r = h.call_plain("A1", AWARDEE_MSP, "GetRemainingAmount", &["G-1"]);
        assert_eq!(r.payload, json!(10000));
    }

    #[test]
    fn test_payment_status_filters() {
        let h = Harness::new();
        busy_grant(&h);

        let r = h.call_plain("A1", AWARDEE_MSP, "GetPaymentByStatus", &["['Accepted']"]);
        assert!(r.success, "{}", r.message);
        assert_eq!(r.payload[0]["grant_id"], "G-1");
        assert_eq!(r.payload[0]["payment"].as_array().map(Vec::len), Some(1));
        assert_eq!(r.payload[0]["payment"][0]["ID"], "P-1");

        let r = h.call_plain("A1", AWARDEE_MSP, "GetPaymentByStatus", &["[\"Requested\", \"Rejected\"]"]);
        let ids: Vec<&str> = r.payload[0]["payment"]
            .as_array()
            .map(|payments| payments.iter().filter_map(|p| p["ID"].as_str()).collect())
            .unwrap_or_default();
        assert_eq!(ids, vec!["P-2", "P-3"]);

        let r = h.call_plain("A1", AWARDEE_MSP, "GetPaymentByStatus", &["Pending-redeem"]);
        assert_eq!(r.payload, json!([]));

        let r = h.call_plain("A1", AWARDEE_MSP, "GetPaymentByStatus", &["['Accepted'"]);
        assert_eq!(r.error_kind.as_deref(), Some("validation_failed"));
    }

    #[test]
    fn test_caller_scoped_listings() {
        let h = Harness::new();
        busy_grant(&h);
        let r = h.call(
            GRANTOR,
            GRANTOR_MSP,
            "InitiateGrant",
            &[],
            payload(tags::GRANT, grant_body("G-2", 500, &[("Books", 500)], 0)),
        );
        assert!(r.success, "{}", r.message);

        let r = h.call_plain(GRANTOR, GRANTOR_MSP, "GetAllGrantsUser", &[]);
        assert_eq!(r.payload.as_array().map(Vec::len), Some(2));

        let r = h.call_plain("S1", SUBAWARDEE_MSP, "GetAllGrantsUser", &[]);
        assert_eq!(r.payload.as_array().map(Vec::len), Some(1));

        let r = h.call_plain("A1", AWARDEE_MSP, "GetAllApprovedGrants", &[]);
        assert_eq!(r.payload[0]["ID"], "G-1");

        let r = h.call_plain(GRANTOR, GRANTOR_MSP, "GetGrantsByStatus", &["Not Assigned"]);
        assert_eq!(r.payload[0]["ID"], "G-2");

        let r = h.call_plain("Z9", AWARDEE_MSP, "GetAllGrantsUser", &[]);
        assert_eq!(r.payload, json!([]));
    }

    #[test]
    fn test_admin_queries_need_grantor_organization() {
        let h = Harness::new();
        busy_grant(&h);

        let r = h.call_plain("A1", AWARDEE_MSP, "GetAllGrants", &[]);
        assert_eq!(r.error_kind.as_deref(), Some("authorization_denied"));

        let r = h.call_plain("A1", AWARDEE_MSP, "GetPaymentByStatusForAllGrants", &["['Accepted']"]);
        assert_eq!(r.error_kind.as_deref(), Some("authorization_denied"));

        // any grantor-organization caller, not only the owner
        let r = h.call_plain("auditor", GRANTOR_MSP, "GetPaymentByStatusForAllGrants", &["['Accepted']"]);
        assert_eq!(r.payload[0]["payment"][0]["ID"], "P-1");

        let r = h.call_plain("auditor", GRANTOR_MSP, "GetAllGrants", &[]);
        assert_eq!(r.payload.as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_participant_read_policy() {
        let h = Harness::new();
        approved_grant(&h);

        let r = h.call_plain("Z9", AWARDEE_MSP, "ReadGrant", &["G-1"]);
        assert_eq!(r.error_kind.as_deref(), Some("authorization_denied"));

        let r = h.call_plain("Z9", AWARDEE_MSP, "ReadGrant", &["G-404"]);
        assert_eq!(r.error_kind.as_deref(), Some("not_found"));

        let open = Harness::with_config(ContractConfig {
            query_policy: QueryPolicy::Open,
            ..ContractConfig::default()
        });
        approved_grant(&open);
        let r = open.call_plain("Z9", AWARDEE_MSP, "ReadGrant", &["G-1"]);
        assert!(r.success, "{}", r.message);
    }

    #[test]
    fn test_config_file_drives_namespace_and_policy() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "[contract]\nkey_namespace = \"research\"\ncross_tier_uniqueness = true\n\n[telemetry]\nlog_level = \"debug\""
        )
        .expect("write config");

        let config = ConfigFile::load(file.path()).expect("config loads");
        assert_eq!(config.telemetry.log_level, "debug");
        assert!(config.contract.cross_tier_uniqueness);

        let h = Harness::with_config(config.contract);
        approved_grant(&h);
        assert_eq!(h.grant("G-1").map(|g| g.id), Some("G-1".to_string()));

        // S1 cannot join the sub tier while already on the main roster
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
        let r = add_subawardee(&h, "S1");
        assert_eq!(r.error_kind.as_deref(), Some("duplicate"));
    }

    #[test]
    fn test_invalid_config_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[contract]\nkey_namespace = \"\"").expect("write config");
        assert!(ConfigFile::load(file.path()).is_err());
    }

    #[test]
    fn test_operations_are_counted() {
        let handle = grant_telemetry::register_metrics().expect("metrics register");
        let h = Harness::new();
        approved_grant(&h);
        let r = request(&h, "A1", AWARDEE_MSP, "P-1", &[("Travel", 9000)]);
        assert!(!r.success);

        let text = handle.encode().expect("metrics encode");
        assert!(text.contains("grant_operations_total"));
        assert!(text.contains("operation=\"AcceptGrant\""));
        assert!(text.contains("grant_admission_rejections_total"));

        let before = grant_telemetry::OPERATIONS
            .with_label_values(&["unknown", "failure"])
            .get();
        let r = h.call_plain(GRANTOR, GRANTOR_MSP, "MintTokens", &[]);
        assert!(!r.success);
        assert!(
            grant_telemetry::OPERATIONS
                .with_label_values(&["unknown", "failure"])
                .get()
                >= before + 1.0
        );
    }
}
