//! # Budget Properties
//!
//! Random sequences of reimbursement requests and payment events applied to
//! an approved grant. Whatever the sequence, every snapshot the transitions
//! produce keeps the category ceilings of both tiers, their shared
//! allocation, the whole-grant ceiling and the paid/cashed-out counters
//! intact.

use grant_contract::algorithms::transitions::{self, RequestLimits};
use grant_contract::domain::lifecycle::PaymentEvent;
use grant_contract::ipc::payloads::{GrantInput, ReimbursementInput};
use grant_contract::{
    Amount, Awardee, Benefit, CallerIdentity, Grant, GrantError, Organization, Payment,
    PaymentItem, Percentage,
};

/// Participants of the generated grant: two main and two sub awardees.
pub const MAIN: [&str; 2] = ["A1", "A2"];
pub const SUB: [&str; 2] = ["S1", "S2"];

/// One generated step.
#[derive(Debug, Clone)]
pub enum Step {
    Request {
        who: usize,
        items: Vec<(usize, u64)>,
    },
    Accept(usize),
    Reject(usize),
    Redeem(usize),
    AcceptRedeem(usize),
    RejectRedeem(usize),
}

fn roster_entry(id: &str, organization: &str) -> Awardee {
    Awardee {
        account_number: format!("ACC-{id}"),
        contact: format!("{id}@example.org"),
        id: id.to_string(),
        name: format!("Researcher {id}"),
        principal_investigator: "Dr. Ada".to_string(),
        organization: organization.to_string(),
        ..Awardee::default()
    }
}

fn category(index: usize) -> String {
    format!("C{index}")
}

/// Approved grant whose amount is the sum of `allocations`.
pub fn approved(allocations: &[u64], sub: u64) -> Result<Grant, GrantError> {
    let grantor = CallerIdentity::new("boss", Organization::Grantor);
    let main = CallerIdentity::new(MAIN[0], Organization::Awardee);
    let benefits: Vec<Benefit> = allocations
        .iter()
        .enumerate()
        .map(|(i, amount)| Benefit::new(category(i), *amount))
        .collect();

    let grant = transitions::initiate(
        &grantor,
        GrantInput {
            id: "G-P".to_string(),
            amount: Amount::new(allocations.iter().sum()),
            benefits,
            sub: Percentage::new(sub).expect("percentage in range"),
            description: String::new(),
            notes: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            payment_type: String::new(),
            progress_freq: String::new(),
        },
    )?;
    let roster = MAIN.iter().map(|id| roster_entry(id, "AwardeeMSP")).collect();
    let grant = transitions::assign(&grantor, grant, roster)?;
    let mut grant = transitions::respond(&main, grant, true)?;
    for id in SUB {
        grant = transitions::add_subawardee(&main, grant, roster_entry(id, "SubawardeeMSP"), false)?;
    }
    Ok(grant)
}

/// Caller of a request step; indices past the main roster are sub awardees.
fn requester(who: usize) -> CallerIdentity {
    match who % 4 {
        i @ 0..=1 => CallerIdentity::new(MAIN[i], Organization::Awardee),
        i => CallerIdentity::new(SUB[i - 2], Organization::Subawardee),
    }
}

/// Apply one step; `Ok(None)` when the step names no payment.
pub fn apply(
    grant: &Grant,
    step: &Step,
    serial: usize,
    categories: usize,
) -> Result<Option<(Grant, Payment)>, GrantError> {
    let grantor = CallerIdentity::new("boss", Organization::Grantor);
    let pick = |index: usize| -> Option<Payment> {
        (!grant.payments.is_empty()).then(|| grant.payments[index % grant.payments.len()].clone())
    };
    let on_payment = |index: usize,
                      event: PaymentEvent,
                      by_owner: bool|
     -> Result<Option<(Grant, Payment)>, GrantError> {
        let Some(payment) = pick(index) else {
            return Ok(None);
        };
        let caller = if by_owner {
            let tier_org = if SUB.contains(&payment.awardee_id.as_str()) {
                Organization::Subawardee
            } else {
                Organization::Awardee
            };
            CallerIdentity::new(payment.awardee_id.clone(), tier_org)
        } else {
            grantor.clone()
        };
        transitions::apply_payment_event(&caller, grant.clone(), &payment.id, event).map(Some)
    };

    match step {
        Step::Request { who, items } => {
            let caller = requester(*who);
            let input = ReimbursementInput {
                id: format!("P-{serial}"),
                grant_id: grant.id.clone(),
                awardee_id: caller.subject_id.clone(),
                notes: String::new(),
                items: items
                    .iter()
                    .map(|(c, amount)| PaymentItem::new(category(c % categories), *amount))
                    .collect(),
            };
            transitions::request_reimbursement(
                &caller,
                grant.clone(),
                input,
                RequestLimits { max_items: 8 },
                String::new(),
            )
            .map(Some)
        }
        Step::Accept(i) => on_payment(*i, PaymentEvent::AcceptReimbursement, false),
        Step::Reject(i) => on_payment(
            *i,
            PaymentEvent::RejectReimbursement {
                reason: "over budget".to_string(),
            },
            false,
        ),
        Step::Redeem(i) => on_payment(*i, PaymentEvent::Redeem, true),
        Step::AcceptRedeem(i) => on_payment(*i, PaymentEvent::AcceptRedeem, false),
        Step::RejectRedeem(i) => on_payment(
            *i,
            PaymentEvent::RejectRedeem {
                reason: "receipt unreadable".to_string(),
            },
            false,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grant_contract::algorithms::budget::{tier_ceiling, Commitments};
    use grant_contract::domain::invariants::check_all_invariants;
    use grant_contract::{AwardeeType, ErrorKind, PaymentStatus};
    use proptest::prelude::*;

    fn step_strategy() -> impl Strategy<Value = Step> {
        prop_oneof![
            4 => (0usize..4, prop::collection::vec((0usize..4, 1u64..2_500), 1..4))
                .prop_map(|(who, items)| Step::Request { who, items }),
            2 => (0usize..16).prop_map(Step::Accept),
            1 => (0usize..16).prop_map(Step::Reject),
            2 => (0usize..16).prop_map(Step::Redeem),
            2 => (0usize..16).prop_map(Step::AcceptRedeem),
            1 => (0usize..16).prop_map(Step::RejectRedeem),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn proptest_snapshots_keep_budget_invariants(
            allocations in prop::collection::vec(0u64..6_000, 1..4),
            sub in 0u64..=100,
            steps in prop::collection::vec(step_strategy(), 1..40),
        ) {
            let mut grant = approved(&allocations, sub).expect("generated grant is valid");

            for (serial, step) in steps.iter().enumerate() {
                match apply(&grant, step, serial, allocations.len()) {
                    Ok(Some((next, _payment))) => {
                        let check = check_all_invariants(Some(&grant), &next);
                        prop_assert!(check.is_valid(), "{:?} after {:?}", check, step);
                        grant = next;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        // refusals are classified, never storage failures
                        prop_assert!(e.kind() != ErrorKind::StorageFailure, "{}", e);
                    }
                }
            }

            let commitments = Commitments::from_grant(&grant).expect("amounts fit");
            for benefit in &grant.benefits {
                prop_assert!(commitments.combined(&benefit.name) <= benefit.amount);
                for tier in [AwardeeType::Main, AwardeeType::Sub] {
                    prop_assert!(
                        commitments.committed(&benefit.name, tier)
                            <= tier_ceiling(benefit.amount, tier, grant.sub)
                    );
                }
            }
            prop_assert!(commitments.active_total() <= grant.amount);
        }

        #[test]
        fn proptest_refusal_reports_true_headroom(
            allocations in prop::collection::vec(1u64..6_000, 1..4),
            sub in 0u64..=100,
            who in 0usize..4,
            items in prop::collection::vec((0usize..4, 1u64..8_000), 1..4),
        ) {
            let grant = approved(&allocations, sub).expect("generated grant is valid");
            let step = Step::Request { who, items };
            if let Err(e) = apply(&grant, &step, 0, allocations.len()) {
                if let Some(v) = e.budget_violation() {
                    let allocation = grant.benefit(&v.category).map(|b| b.amount).unwrap_or(Amount::ZERO);
                    prop_assert_eq!(v.ceiling, tier_ceiling(allocation, v.tier, grant.sub));
                    prop_assert_eq!(v.committed, Amount::ZERO);
                    prop_assert_eq!(v.remaining, v.ceiling);
                    prop_assert!(v.requested > v.ceiling || v.requested > allocation);
                }
            }
        }

        #[test]
        fn proptest_rejection_frees_budget(
            allocation in 1u64..6_000,
            sub in 0u64..=100,
        ) {
            let grant = approved(&[allocation], sub).expect("generated grant is valid");
            let fill = Step::Request { who: 0, items: vec![(0, allocation)] };
            let (grant, payment) = apply(&grant, &fill, 0, 1)
                .expect("full allocation is admitted")
                .expect("request yields a payment");

            let over_allocation_rejected = apply(&grant, &Step::Request { who: 1, items: vec![(0, 1)] }, 1, 1).is_err();
            prop_assert!(over_allocation_rejected);

            let (grant, rejected) = apply(&grant, &Step::Reject(0), 2, 1)
                .expect("requested payment can be rejected")
                .expect("payment exists");
            prop_assert_eq!(&rejected.id, &payment.id);
            let is_rejected = matches!(rejected.status, PaymentStatus::Rejected { .. });
            prop_assert!(is_rejected);
            let freed_allocation_admitted = apply(&grant, &Step::Request { who: 1, items: vec![(0, allocation)] }, 3, 1).is_ok();
            prop_assert!(freed_allocation_admitted);
        }
    }
}
