#![no_std]
use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, log, symbol_short, vec, Address, Env,
    IntoVal, InvokeError, Symbol, Val, Vec,
};


// ─────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────

/// Basis-point denominator: 10000 = 100%.
const BPS_DENOMINATOR: i128 = 10_000;
const MAX_LTV_BPS: u32 = 10_000;
const SECONDS_IN_YEAR: u64 = 31_536_000;

// ─────────────────────────────────────────────────
// Data Types
// ─────────────────────────────────────────────────

/// Market risk parameters. Token identities, the price unit and the
/// whitelist flag are fixed at initialization; caps and the accrual rate
/// are admin-settable afterwards.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MarketConfig {
    pub collateral_token: Address,
    pub debt_token: Address,
    pub max_ltv_bps: u32,     // Debt/collateral ceiling in basis points
    pub min_collateral: i128, // Smallest collateral size accepted at open
    pub max_borrow: i128,     // Cap on outstanding principal per loan
    pub price_unit: i128,     // Collateral units per debt unit (1:1 value, decimal rescale only)
    pub whitelist_enabled: bool,
    pub burner: Address,         // Where settled debt tokens go to be destroyed
    pub interest_rate_bps: u32,  // Annualized simple-interest rate, 0 = no accrual
}

/// Aggregate counters. Must stay consistent with the loan book after
/// every state-changing call.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MarketState {
    pub total_collateral: i128,  // Sum of collateral across open loans
    pub total_loans: u32,        // Count of open loans
    pub total_interest: i128,    // Interest charged but not yet settled
    pub total_whitelisted: u32,  // Admitted borrowers while whitelist mode is on
    pub paused: bool,
}

/// One open loan. "No loan" is the absence of the storage entry, never a
/// zeroed record; collateral and principal are strictly positive while the
/// entry exists.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Loan {
    pub collateral: i128,
    pub principal: i128,
    pub interest_accrued: i128,
    pub last_accrual_ts: u64,
}

// ─────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LoanOpenedEvent {
    pub borrower: Address,
    pub collateral: i128,
    pub principal: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LoanClosedEvent {
    pub borrower: Address,
    pub collateral_returned: i128,
    pub settled: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LoanIncreasedEvent {
    pub borrower: Address,
    pub collateral_added: i128,
    pub principal_added: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LoanDecreasedEvent {
    pub borrower: Address,
    pub collateral_withdrawn: i128,
    pub principal_repaid: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InterestAccruedEvent {
    pub borrower: Address,
    pub amount: i128,
}

// ─────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────

#[contracterror]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MarketError {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    Unauthorized = 3,
    MarketPaused = 4,
    NotWhitelisted = 5,
    WhitelistDisabled = 6,
    AlreadyWhitelisted = 7,
    InvalidAmount = 8,
    BelowMinCollateral = 9,
    AboveMaxBorrow = 10,
    LtvExceeded = 11,
    LoanAlreadyExists = 12,
    LoanNotFound = 13,
    InsufficientFunds = 14,
    MathOverflow = 15,
}

// ─────────────────────────────────────────────────
// Storage Keys
// ─────────────────────────────────────────────────

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Admin,
    Config,
    State,
    Loan(Address),
    Whitelisted(Address),
}

// ─────────────────────────────────────────────────
// Contract
// ─────────────────────────────────────────────────

#[contract]
pub struct MarketContract;

#[contractimpl]
impl MarketContract {
    // ─── Admin / Init ───────────────────────────────

    /// Initialize the market with its token pair, risk parameters and
    /// controlling admin. Can only be called once.
    #[allow(clippy::too_many_arguments)]
    pub fn initialize(
        env: Env,
        admin: Address,
        collateral_token: Address,
        debt_token: Address,
        max_ltv_bps: u32,
        min_collateral: i128,
        max_borrow: i128,
        price_unit: i128,
        whitelist_enabled: bool,
        burner: Address,
    ) -> Result<(), MarketError> {
        admin.require_auth();
        if env.storage().instance().has(&DataKey::Admin) {
            return Err(MarketError::AlreadyInitialized);
        }
        if max_ltv_bps > MAX_LTV_BPS {
            return Err(MarketError::InvalidAmount);
        }
        if min_collateral <= 0 || max_borrow <= 0 || price_unit <= 0 {
            return Err(MarketError::InvalidAmount);
        }
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(
            &DataKey::Config,
            &MarketConfig {
                collateral_token,
                debt_token,
                max_ltv_bps,
                min_collateral,
                max_borrow,
                price_unit,
                whitelist_enabled,
                burner,
                interest_rate_bps: 0,
            },
        );
        env.storage().instance().set(
            &DataKey::State,
            &MarketState {
                total_collateral: 0,
                total_loans: 0,
                total_interest: 0,
                total_whitelisted: 0,
                paused: false,
            },
        );
        Ok(())
    }

    fn require_initialized(env: &Env) -> Result<(), MarketError> {
        if !env.storage().instance().has(&DataKey::Admin) {
            return Err(MarketError::NotInitialized);
        }
        Ok(())
    }

    fn admin(env: &Env) -> Address {
        env.storage().instance().get(&DataKey::Admin).unwrap()
    }

    fn require_admin(env: &Env, caller: &Address) -> Result<(), MarketError> {
        caller.require_auth();
        if *caller != Self::admin(env) {
            return Err(MarketError::Unauthorized);
        }
        Ok(())
    }

    fn config(env: &Env) -> MarketConfig {
        env.storage().instance().get(&DataKey::Config).unwrap()
    }

    fn set_config(env: &Env, config: &MarketConfig) {
        env.storage().instance().set(&DataKey::Config, config);
    }

    fn state(env: &Env) -> MarketState {
        env.storage().instance().get(&DataKey::State).unwrap()
    }

    fn set_state(env: &Env, state: &MarketState) {
        env.storage().instance().set(&DataKey::State, state);
    }

    fn loan_of(env: &Env, borrower: &Address) -> Result<Loan, MarketError> {
        env.storage()
            .persistent()
            .get(&DataKey::Loan(borrower.clone()))
            .ok_or(MarketError::LoanNotFound)
    }

    fn set_loan(env: &Env, borrower: &Address, loan: &Loan) {
        env.storage()
            .persistent()
            .set(&DataKey::Loan(borrower.clone()), loan);
    }

    fn whitelisted(env: &Env, borrower: &Address) -> bool {
        env.storage()
            .persistent()
            .get(&DataKey::Whitelisted(borrower.clone()))
            .unwrap_or(false)
    }

    /// Whitelist admission, re-evaluated on every open and add.
    fn require_admitted(
        env: &Env,
        config: &MarketConfig,
        borrower: &Address,
    ) -> Result<(), MarketError> {
        if config.whitelist_enabled && !Self::whitelisted(env, borrower) {
            return Err(MarketError::NotWhitelisted);
        }
        Ok(())
    }

    // ─── Token plumbing ─────────────────────────────

    /// Pay out of the market's own balance. A failed transfer (typically an
    /// underfunded market) aborts the whole call.
    fn pay(env: &Env, token: &Address, to: &Address, amount: i128) -> Result<(), MarketError> {
        let args: Vec<Val> = vec![
            env,
            env.current_contract_address().into_val(env),
            to.clone().into_val(env),
            amount.into_val(env),
        ];
        env.try_invoke_contract::<(), InvokeError>(token, &symbol_short!("transfer"), args)
            .map_err(|_| MarketError::InsufficientFunds)?
            .map_err(|_| MarketError::InsufficientFunds)
    }

    /// Pull tokens the caller has approved to the market. Balance or
    /// allowance shortfalls surface as `InsufficientFunds`.
    fn pull(
        env: &Env,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: i128,
    ) -> Result<(), MarketError> {
        let args: Vec<Val> = vec![
            env,
            env.current_contract_address().into_val(env),
            from.clone().into_val(env),
            to.clone().into_val(env),
            amount.into_val(env),
        ];
        env.try_invoke_contract::<(), InvokeError>(token, &Symbol::new(env, "transfer_from"), args)
            .map_err(|_| MarketError::InsufficientFunds)?
            .map_err(|_| MarketError::InsufficientFunds)
    }

    // ─── Math ───────────────────────────────────────

    /// Enforce `principal * price_unit * 10000 <= collateral * max_ltv_bps`
    /// under the fixed 1:1 collateral/debt unit-value assumption.
    fn check_ltv(
        config: &MarketConfig,
        collateral: i128,
        principal: i128,
    ) -> Result<(), MarketError> {
        let debt_side = principal
            .checked_mul(config.price_unit)
            .and_then(|v| v.checked_mul(BPS_DENOMINATOR))
            .ok_or(MarketError::MathOverflow)?;
        let collateral_side = collateral
            .checked_mul(config.max_ltv_bps as i128)
            .ok_or(MarketError::MathOverflow)?;
        if debt_side > collateral_side {
            return Err(MarketError::LtvExceeded);
        }
        Ok(())
    }

    /// Simple interest for a principal over elapsed seconds:
    /// `principal * rate_bps * elapsed / (10000 * SECONDS_IN_YEAR)`.
    fn calculate_interest(principal: i128, rate_bps: u32, elapsed_seconds: u64) -> i128 {
        if elapsed_seconds == 0 || rate_bps == 0 {
            return 0;
        }
        let numerator = (principal as u128)
            .checked_mul(rate_bps as u128)
            .and_then(|v| v.checked_mul(elapsed_seconds as u128))
            .unwrap_or(0);
        let denominator = (BPS_DENOMINATOR as u128) * (SECONDS_IN_YEAR as u128);
        (numerator / denominator) as i128
    }

    // ─── Loan lifecycle ─────────────────────────────

    /// Open a loan: lock `collateral` of the collateral token and borrow
    /// `borrow` of the debt token against it. One open loan per borrower.
    pub fn open_loan(
        env: Env,
        borrower: Address,
        collateral: i128,
        borrow: i128,
    ) -> Result<(), MarketError> {
        Self::require_initialized(&env)?;
        borrower.require_auth();

        let config = Self::config(&env);
        let mut state = Self::state(&env);

        if state.paused {
            return Err(MarketError::MarketPaused);
        }
        if collateral <= 0 || borrow <= 0 {
            return Err(MarketError::InvalidAmount);
        }
        Self::require_admitted(&env, &config, &borrower)?;
        if env
            .storage()
            .persistent()
            .has(&DataKey::Loan(borrower.clone()))
        {
            return Err(MarketError::LoanAlreadyExists);
        }
        if collateral < config.min_collateral {
            return Err(MarketError::BelowMinCollateral);
        }
        if borrow > config.max_borrow {
            return Err(MarketError::AboveMaxBorrow);
        }
        Self::check_ltv(&config, collateral, borrow)?;

        let contract_id = env.current_contract_address();
        Self::pull(&env, &config.collateral_token, &borrower, &contract_id, collateral)?;
        Self::pay(&env, &config.debt_token, &borrower, borrow)?;

        Self::set_loan(
            &env,
            &borrower,
            &Loan {
                collateral,
                principal: borrow,
                interest_accrued: 0,
                last_accrual_ts: env.ledger().timestamp(),
            },
        );

        state.total_collateral = state
            .total_collateral
            .checked_add(collateral)
            .ok_or(MarketError::MathOverflow)?;
        state.total_loans += 1;
        Self::set_state(&env, &state);

        env.events().publish(
            (symbol_short!("MARKET"), symbol_short!("OPEN")),
            LoanOpenedEvent {
                borrower: borrower.clone(),
                collateral,
                principal: borrow,
            },
        );
        log!(&env, "Opened loan: {} collateral, {} borrowed", collateral, borrow);
        Ok(())
    }

    /// Close the caller's loan: settle principal plus accrued interest in
    /// full, route the settlement to the burner and return all collateral.
    /// Remains callable while the market is paused.
    pub fn close_loan(env: Env, borrower: Address) -> Result<(), MarketError> {
        Self::require_initialized(&env)?;
        borrower.require_auth();

        let config = Self::config(&env);
        let mut state = Self::state(&env);
        let loan = Self::loan_of(&env, &borrower)?;

        let owed = loan
            .principal
            .checked_add(loan.interest_accrued)
            .ok_or(MarketError::MathOverflow)?;

        let contract_id = env.current_contract_address();
        Self::pull(&env, &config.debt_token, &borrower, &contract_id, owed)?;
        Self::pay(&env, &config.debt_token, &config.burner, owed)?;
        Self::pay(&env, &config.collateral_token, &borrower, loan.collateral)?;

        env.storage()
            .persistent()
            .remove(&DataKey::Loan(borrower.clone()));

        state.total_collateral -= loan.collateral;
        state.total_loans -= 1;
        state.total_interest -= loan.interest_accrued;
        Self::set_state(&env, &state);

        env.events().publish(
            (symbol_short!("MARKET"), symbol_short!("CLOSE")),
            LoanClosedEvent {
                borrower: borrower.clone(),
                collateral_returned: loan.collateral,
                settled: owed,
            },
        );
        log!(&env, "Closed loan: {} settled, {} returned", owed, loan.collateral);
        Ok(())
    }

    /// Grow an open loan by depositing more collateral, borrowing more, or
    /// both. Admission and pause are re-checked even though the loan
    /// already exists.
    pub fn add_to_loan(
        env: Env,
        borrower: Address,
        extra_collateral: i128,
        extra_borrow: i128,
    ) -> Result<(), MarketError> {
        Self::require_initialized(&env)?;
        borrower.require_auth();

        let config = Self::config(&env);
        let mut state = Self::state(&env);

        if state.paused {
            return Err(MarketError::MarketPaused);
        }
        if extra_collateral < 0 || extra_borrow < 0 {
            return Err(MarketError::InvalidAmount);
        }
        if extra_collateral == 0 && extra_borrow == 0 {
            return Err(MarketError::InvalidAmount);
        }
        Self::require_admitted(&env, &config, &borrower)?;

        let mut loan = Self::loan_of(&env, &borrower)?;

        let new_principal = loan
            .principal
            .checked_add(extra_borrow)
            .ok_or(MarketError::MathOverflow)?;
        let new_collateral = loan
            .collateral
            .checked_add(extra_collateral)
            .ok_or(MarketError::MathOverflow)?;
        if new_principal > config.max_borrow {
            return Err(MarketError::AboveMaxBorrow);
        }
        Self::check_ltv(&config, new_collateral, new_principal)?;

        let contract_id = env.current_contract_address();
        if extra_collateral > 0 {
            Self::pull(
                &env,
                &config.collateral_token,
                &borrower,
                &contract_id,
                extra_collateral,
            )?;
        }
        if extra_borrow > 0 {
            Self::pay(&env, &config.debt_token, &borrower, extra_borrow)?;
        }

        loan.collateral = new_collateral;
        loan.principal = new_principal;
        Self::set_loan(&env, &borrower, &loan);

        state.total_collateral = state
            .total_collateral
            .checked_add(extra_collateral)
            .ok_or(MarketError::MathOverflow)?;
        Self::set_state(&env, &state);

        env.events().publish(
            (symbol_short!("MARKET"), symbol_short!("ADD")),
            LoanIncreasedEvent {
                borrower: borrower.clone(),
                collateral_added: extra_collateral,
                principal_added: extra_borrow,
            },
        );
        Ok(())
    }

    /// Shrink an open loan by withdrawing collateral, repaying principal, or
    /// both. The loan must stay above the minimum collateral size and within
    /// the LTV ceiling, and the principal must stay positive: full repayment
    /// goes through `close_loan`. Remains callable while paused.
    pub fn remove_from_loan(
        env: Env,
        borrower: Address,
        withdraw_collateral: i128,
        repay_principal: i128,
    ) -> Result<(), MarketError> {
        Self::require_initialized(&env)?;
        borrower.require_auth();

        let config = Self::config(&env);
        let mut state = Self::state(&env);

        if withdraw_collateral < 0 || repay_principal < 0 {
            return Err(MarketError::InvalidAmount);
        }
        if withdraw_collateral == 0 && repay_principal == 0 {
            return Err(MarketError::InvalidAmount);
        }

        let mut loan = Self::loan_of(&env, &borrower)?;

        if withdraw_collateral > loan.collateral {
            return Err(MarketError::InvalidAmount);
        }
        if repay_principal >= loan.principal {
            return Err(MarketError::InvalidAmount);
        }

        let remaining_collateral = loan.collateral - withdraw_collateral;
        let remaining_principal = loan.principal - repay_principal;
        if remaining_collateral < config.min_collateral {
            return Err(MarketError::BelowMinCollateral);
        }
        Self::check_ltv(&config, remaining_collateral, remaining_principal)?;

        let contract_id = env.current_contract_address();
        if repay_principal > 0 {
            Self::pull(&env, &config.debt_token, &borrower, &contract_id, repay_principal)?;
            Self::pay(&env, &config.debt_token, &config.burner, repay_principal)?;
        }
        if withdraw_collateral > 0 {
            Self::pay(&env, &config.collateral_token, &borrower, withdraw_collateral)?;
        }

        loan.collateral = remaining_collateral;
        loan.principal = remaining_principal;
        Self::set_loan(&env, &borrower, &loan);

        state.total_collateral -= withdraw_collateral;
        Self::set_state(&env, &state);

        env.events().publish(
            (symbol_short!("MARKET"), symbol_short!("REMOVE")),
            LoanDecreasedEvent {
                borrower: borrower.clone(),
                collateral_withdrawn: withdraw_collateral,
                principal_repaid: repay_principal,
            },
        );
        Ok(())
    }

    /// Accrue interest on a borrower's loan at the configured rate since the
    /// loan's last accrual. Admin only; the rate is policy, not protocol.
    pub fn update_interest(env: Env, caller: Address, borrower: Address) -> Result<i128, MarketError> {
        Self::require_initialized(&env)?;
        Self::require_admin(&env, &caller)?;

        let config = Self::config(&env);
        let mut state = Self::state(&env);
        let mut loan = Self::loan_of(&env, &borrower)?;

        let now = env.ledger().timestamp();
        let elapsed = now.saturating_sub(loan.last_accrual_ts);
        let interest = Self::calculate_interest(loan.principal, config.interest_rate_bps, elapsed);

        loan.interest_accrued = loan
            .interest_accrued
            .checked_add(interest)
            .ok_or(MarketError::MathOverflow)?;
        loan.last_accrual_ts = now;
        Self::set_loan(&env, &borrower, &loan);

        state.total_interest = state
            .total_interest
            .checked_add(interest)
            .ok_or(MarketError::MathOverflow)?;
        Self::set_state(&env, &state);

        env.events().publish(
            (symbol_short!("MARKET"), symbol_short!("INTEREST")),
            InterestAccruedEvent {
                borrower: borrower.clone(),
                amount: interest,
            },
        );
        Ok(interest)
    }

    // ─── Risk parameter administration ──────────────

    /// Admin only. The cap must stay positive.
    pub fn set_max_borrow_amount(env: Env, caller: Address, amount: i128) -> Result<(), MarketError> {
        Self::require_initialized(&env)?;
        Self::require_admin(&env, &caller)?;
        if amount <= 0 {
            return Err(MarketError::InvalidAmount);
        }
        let mut config = Self::config(&env);
        config.max_borrow = amount;
        Self::set_config(&env, &config);
        Ok(())
    }

    /// Admin only. The ceiling cannot exceed 100% (10000 bps).
    pub fn set_max_ltv_ratio(env: Env, caller: Address, ratio_bps: u32) -> Result<(), MarketError> {
        Self::require_initialized(&env)?;
        Self::require_admin(&env, &caller)?;
        if ratio_bps > MAX_LTV_BPS {
            return Err(MarketError::InvalidAmount);
        }
        let mut config = Self::config(&env);
        config.max_ltv_bps = ratio_bps;
        Self::set_config(&env, &config);
        Ok(())
    }

    /// Admin only. Sets the annualized rate used by `update_interest`.
    pub fn set_interest_rate(env: Env, caller: Address, rate_bps: u32) -> Result<(), MarketError> {
        Self::require_initialized(&env)?;
        Self::require_admin(&env, &caller)?;
        let mut config = Self::config(&env);
        config.interest_rate_bps = rate_bps;
        Self::set_config(&env, &config);
        Ok(())
    }

    // ─── Whitelist administration ───────────────────

    /// Admit a borrower. Admin only, whitelist markets only; admitting an
    /// existing member fails.
    pub fn add_whitelist_borrower(
        env: Env,
        caller: Address,
        borrower: Address,
    ) -> Result<(), MarketError> {
        Self::require_initialized(&env)?;
        Self::require_admin(&env, &caller)?;
        let config = Self::config(&env);
        if !config.whitelist_enabled {
            return Err(MarketError::WhitelistDisabled);
        }
        if Self::whitelisted(&env, &borrower) {
            return Err(MarketError::AlreadyWhitelisted);
        }
        env.storage()
            .persistent()
            .set(&DataKey::Whitelisted(borrower), &true);
        let mut state = Self::state(&env);
        state.total_whitelisted += 1;
        Self::set_state(&env, &state);
        Ok(())
    }

    /// Evict a borrower. Admin only, whitelist markets only; removing a
    /// non-member fails. An already-open loan stays open but can no longer
    /// be augmented.
    pub fn remove_whitelist_borrower(
        env: Env,
        caller: Address,
        borrower: Address,
    ) -> Result<(), MarketError> {
        Self::require_initialized(&env)?;
        Self::require_admin(&env, &caller)?;
        let config = Self::config(&env);
        if !config.whitelist_enabled {
            return Err(MarketError::WhitelistDisabled);
        }
        if !Self::whitelisted(&env, &borrower) {
            return Err(MarketError::NotWhitelisted);
        }
        env.storage()
            .persistent()
            .remove(&DataKey::Whitelisted(borrower));
        let mut state = Self::state(&env);
        state.total_whitelisted -= 1;
        Self::set_state(&env, &state);
        Ok(())
    }

    /// Flip the circuit breaker. Admin only. While paused, open and add are
    /// rejected; close and remove keep working so borrowers can exit.
    pub fn toggle_pause(env: Env, caller: Address) -> Result<bool, MarketError> {
        Self::require_initialized(&env)?;
        Self::require_admin(&env, &caller)?;
        let mut state = Self::state(&env);
        state.paused = !state.paused;
        Self::set_state(&env, &state);
        Ok(state.paused)
    }

    // ─── Read-only ──────────────────────────────────

    pub fn get_config(env: Env) -> Result<MarketConfig, MarketError> {
        Self::require_initialized(&env)?;
        Ok(Self::config(&env))
    }

    pub fn get_state(env: Env) -> Result<MarketState, MarketError> {
        Self::require_initialized(&env)?;
        Ok(Self::state(&env))
    }

    pub fn get_admin(env: Env) -> Result<Address, MarketError> {
        Self::require_initialized(&env)?;
        Ok(Self::admin(&env))
    }

    pub fn get_loan(env: Env, borrower: Address) -> Result<Loan, MarketError> {
        Self::require_initialized(&env)?;
        Self::loan_of(&env, &borrower)
    }

    pub fn has_loan(env: Env, borrower: Address) -> bool {
        env.storage().persistent().has(&DataKey::Loan(borrower))
    }

    pub fn is_whitelisted(env: Env, borrower: Address) -> bool {
        Self::whitelisted(&env, &borrower)
    }
}
