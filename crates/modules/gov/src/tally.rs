use std::collections::BTreeMap;

use lbm_core::address::ValAddress;
use lbm_core::dec::Dec;
use lbm_module::module::db::{DbResult, ModuleWriteTransactionCtx};

use crate::module::GovModule;
use crate::types::{Proposal, TallyResult, VoteOption, WeightedVoteOption};

pub(crate) struct TallyOutcome {
    pub passes: bool,
    pub burn_deposits: bool,
    pub result: TallyResult,
}

/// Bonded validator as seen by the tally
struct ValidatorVotingInfo {
    tokens: u128,
    delegator_shares: Dec,
    /// Shares of delegators that voted themselves
    deductions: Dec,
    vote: Option<Vec<WeightedVoteOption>>,
}

impl ValidatorVotingInfo {
    fn power_of(&self, shares: &Dec) -> Dec {
        shares.mul_int(self.tokens).quo(&self.delegator_shares)
    }
}

#[derive(Default)]
struct Totals {
    per_option: BTreeMap<VoteOption, Dec>,
    total: Dec,
}

impl Totals {
    fn add(&mut self, options: &[WeightedVoteOption], power: &Dec) {
        for option in options {
            let entry = self.per_option.entry(option.option).or_default();
            *entry += &power.mul(&option.weight);
        }
        self.total += power;
    }

    fn of(&self, option: VoteOption) -> Dec {
        self.per_option.get(&option).cloned().unwrap_or_default()
    }

    fn to_result(&self) -> TallyResult {
        let truncated = |option| self.of(option).truncate_u128().unwrap_or_default();
        TallyResult {
            yes: truncated(VoteOption::Yes),
            abstain: truncated(VoteOption::Abstain),
            no: truncated(VoteOption::No),
            no_with_veto: truncated(VoteOption::NoWithVeto),
        }
    }
}

impl GovModule {
    /// Count the votes cast on `proposal` by bonded stake
    ///
    /// Delegators voting themselves override the vote of their validator
    /// for their share of its power.
    pub(crate) fn tally_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        proposal: &Proposal,
    ) -> DbResult<TallyOutcome> {
        let tally_params = Self::get_params_tx(dbtx)?.tally;

        let mut validators: BTreeMap<ValAddress, ValidatorVotingInfo> = self
            .staking
            .validators(dbtx)?
            .into_iter()
            .filter(|v| v.bonded && !v.delegator_shares.is_zero())
            .map(|v| {
                (
                    v.operator,
                    ValidatorVotingInfo {
                        tokens: v.tokens,
                        delegator_shares: v.delegator_shares,
                        deductions: Dec::zero(),
                        vote: None,
                    },
                )
            })
            .collect();

        let mut totals = Totals::default();
        for vote in Self::votes_of_tx(dbtx, proposal.id)? {
            if let Some(validator) = validators.get_mut(&vote.voter.to_val()) {
                validator.vote = Some(vote.options.clone());
            }

            for delegation in self.staking.delegator_delegations(dbtx, vote.voter)? {
                let Some(validator) = validators.get_mut(&delegation.validator) else {
                    continue;
                };
                validator.deductions += &delegation.shares;
                let power = validator.power_of(&delegation.shares);
                totals.add(&vote.options, &power);
            }
        }

        for validator in validators.values() {
            let Some(options) = &validator.vote else {
                continue;
            };
            let shares = &validator.delegator_shares - &validator.deductions;
            let power = validator.power_of(&shares);
            totals.add(options, &power);
        }

        let result = totals.to_result();
        let outcome = |passes, burn_deposits| TallyOutcome {
            passes,
            burn_deposits,
            result: result.clone(),
        };

        let total_bonded = self.staking.total_bonded_tokens(dbtx)?;
        if total_bonded == 0 {
            return Ok(outcome(false, false));
        }

        if totals.total.quo(&Dec::from(total_bonded)) < tally_params.quorum {
            return Ok(outcome(false, true));
        }

        let non_abstaining = &totals.total - &totals.of(VoteOption::Abstain);
        if non_abstaining.is_zero() {
            return Ok(outcome(false, false));
        }

        if totals.of(VoteOption::NoWithVeto).quo(&totals.total) > tally_params.veto_threshold {
            return Ok(outcome(false, true));
        }

        if totals.of(VoteOption::Yes).quo(&non_abstaining) > tally_params.threshold {
            return Ok(outcome(true, false));
        }

        Ok(outcome(false, false))
    }
}
