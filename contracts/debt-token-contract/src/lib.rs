#![no_std]
use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, panic_with_error,
    token::TokenInterface, Address, Env, String,
};


// ─────────────────────────────────────────────────
// Data Types
// ─────────────────────────────────────────────────

/// Allowance with an expiration ledger. Reads as zero once the
/// ledger sequence passes `live_until_ledger`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AllowanceValue {
    pub amount: i128,
    pub live_until_ledger: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokenMetadata {
    pub decimals: u32,
    pub name: String,
    pub symbol: String,
}

// ─────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────

#[contracterror]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TokenError {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    Unauthorized = 3,
    InsufficientBalance = 4,
    InsufficientAllowance = 5,
    InvalidAmount = 6,
    InvalidExpiration = 7,
}

// ─────────────────────────────────────────────────
// Storage Keys
// ─────────────────────────────────────────────────

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Admin,
    Minter,
    Burner,
    Controller,
    Metadata,
    Balance(Address),
    Allowance(Address, Address),
}

// ─────────────────────────────────────────────────
// Contract
// ─────────────────────────────────────────────────

#[contract]
pub struct DebtTokenContract;

#[contractimpl]
impl DebtTokenContract {
    // ─── Admin / Init ───────────────────────────────

    /// Initialize the token and seat all three delegated roles
    /// (minter, burner, controller) at the admin. Can only be called once.
    pub fn initialize(
        env: Env,
        admin: Address,
        decimals: u32,
        name: String,
        symbol: String,
        initial_supply: i128,
    ) -> Result<(), TokenError> {
        admin.require_auth();
        if env.storage().instance().has(&DataKey::Admin) {
            return Err(TokenError::AlreadyInitialized);
        }
        if initial_supply < 0 {
            return Err(TokenError::InvalidAmount);
        }
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::Minter, &admin);
        env.storage().instance().set(&DataKey::Burner, &admin);
        env.storage().instance().set(&DataKey::Controller, &admin);
        env.storage().instance().set(
            &DataKey::Metadata,
            &TokenMetadata {
                decimals,
                name,
                symbol,
            },
        );
        if initial_supply > 0 {
            Self::credit_balance(&env, &admin, initial_supply);
        }
        Ok(())
    }

    fn require_initialized(env: &Env) -> Result<(), TokenError> {
        if !env.storage().instance().has(&DataKey::Admin) {
            return Err(TokenError::NotInitialized);
        }
        Ok(())
    }

    fn get_role(env: &Env, key: &DataKey) -> Address {
        env.storage().instance().get(key).unwrap()
    }

    fn require_role(env: &Env, caller: &Address, key: &DataKey) -> Result<(), TokenError> {
        caller.require_auth();
        if *caller != Self::get_role(env, key) {
            return Err(TokenError::Unauthorized);
        }
        Ok(())
    }

    // ─── Balance helpers ────────────────────────────

    fn read_balance(env: &Env, id: &Address) -> i128 {
        env.storage()
            .persistent()
            .get(&DataKey::Balance(id.clone()))
            .unwrap_or(0i128)
    }

    fn credit_balance(env: &Env, id: &Address, amount: i128) {
        let balance = Self::read_balance(env, id);
        env.storage()
            .persistent()
            .set(&DataKey::Balance(id.clone()), &(balance + amount));
    }

    fn debit_balance(env: &Env, id: &Address, amount: i128) {
        let balance = Self::read_balance(env, id);
        if balance < amount {
            panic_with_error!(env, TokenError::InsufficientBalance);
        }
        env.storage()
            .persistent()
            .set(&DataKey::Balance(id.clone()), &(balance - amount));
    }

    fn read_allowance(env: &Env, from: &Address, spender: &Address) -> AllowanceValue {
        let key = DataKey::Allowance(from.clone(), spender.clone());
        let allowance: Option<AllowanceValue> = env.storage().persistent().get(&key);
        match allowance {
            Some(a) if a.live_until_ledger >= env.ledger().sequence() => a,
            _ => AllowanceValue {
                amount: 0,
                live_until_ledger: 0,
            },
        }
    }

    fn spend_allowance(env: &Env, from: &Address, spender: &Address, amount: i128) {
        let allowance = Self::read_allowance(env, from, spender);
        if allowance.amount < amount {
            panic_with_error!(env, TokenError::InsufficientAllowance);
        }
        env.storage().persistent().set(
            &DataKey::Allowance(from.clone(), spender.clone()),
            &AllowanceValue {
                amount: allowance.amount - amount,
                live_until_ledger: allowance.live_until_ledger,
            },
        );
    }

    fn check_nonnegative(env: &Env, amount: i128) {
        if amount < 0 {
            panic_with_error!(env, TokenError::InvalidAmount);
        }
    }

    // ─── Role management ────────────────────────────

    /// Hand the minter role to a new address. Only the current minter may call.
    pub fn set_minter(env: Env, caller: Address, new_minter: Address) -> Result<(), TokenError> {
        Self::require_initialized(&env)?;
        Self::require_role(&env, &caller, &DataKey::Minter)?;
        env.storage().instance().set(&DataKey::Minter, &new_minter);
        Ok(())
    }

    /// Hand the burner role to a new address. Only the current burner may call.
    pub fn set_burner(env: Env, caller: Address, new_burner: Address) -> Result<(), TokenError> {
        Self::require_initialized(&env)?;
        Self::require_role(&env, &caller, &DataKey::Burner)?;
        env.storage().instance().set(&DataKey::Burner, &new_burner);
        Ok(())
    }

    /// Hand the controller role to a new address. Only the current controller may call.
    pub fn set_controller(
        env: Env,
        caller: Address,
        new_controller: Address,
    ) -> Result<(), TokenError> {
        Self::require_initialized(&env)?;
        Self::require_role(&env, &caller, &DataKey::Controller)?;
        env.storage()
            .instance()
            .set(&DataKey::Controller, &new_controller);
        Ok(())
    }

    /// Create new supply for `to`. Restricted to the minter and controller roles.
    pub fn mint_to(env: Env, caller: Address, to: Address, amount: i128) -> Result<(), TokenError> {
        Self::require_initialized(&env)?;
        caller.require_auth();
        if caller != Self::get_role(&env, &DataKey::Minter)
            && caller != Self::get_role(&env, &DataKey::Controller)
        {
            return Err(TokenError::Unauthorized);
        }
        if amount <= 0 {
            return Err(TokenError::InvalidAmount);
        }
        Self::credit_balance(&env, &to, amount);
        Ok(())
    }

    pub fn get_minter(env: Env) -> Address {
        Self::get_role(&env, &DataKey::Minter)
    }

    pub fn get_burner(env: Env) -> Address {
        Self::get_role(&env, &DataKey::Burner)
    }

    pub fn get_controller(env: Env) -> Address {
        Self::get_role(&env, &DataKey::Controller)
    }
}

// ─────────────────────────────────────────────────
// SEP-41 token interface
// ─────────────────────────────────────────────────

#[contractimpl]
impl TokenInterface for DebtTokenContract {
    fn allowance(env: Env, from: Address, spender: Address) -> i128 {
        Self::read_allowance(&env, &from, &spender).amount
    }

    fn approve(env: Env, from: Address, spender: Address, amount: i128, expiration_ledger: u32) {
        from.require_auth();
        Self::check_nonnegative(&env, amount);
        if amount > 0 && expiration_ledger < env.ledger().sequence() {
            panic_with_error!(env, TokenError::InvalidExpiration);
        }
        env.storage().persistent().set(
            &DataKey::Allowance(from, spender),
            &AllowanceValue {
                amount,
                live_until_ledger: expiration_ledger,
            },
        );
    }

    fn balance(env: Env, id: Address) -> i128 {
        Self::read_balance(&env, &id)
    }

    fn transfer(env: Env, from: Address, to: Address, amount: i128) {
        from.require_auth();
        Self::check_nonnegative(&env, amount);
        Self::debit_balance(&env, &from, amount);
        Self::credit_balance(&env, &to, amount);
    }

    fn transfer_from(env: Env, spender: Address, from: Address, to: Address, amount: i128) {
        spender.require_auth();
        Self::check_nonnegative(&env, amount);
        Self::spend_allowance(&env, &from, &spender, amount);
        Self::debit_balance(&env, &from, amount);
        Self::credit_balance(&env, &to, amount);
    }

    fn burn(env: Env, from: Address, amount: i128) {
        from.require_auth();
        Self::check_nonnegative(&env, amount);
        Self::debit_balance(&env, &from, amount);
    }

    fn burn_from(env: Env, spender: Address, from: Address, amount: i128) {
        spender.require_auth();
        Self::check_nonnegative(&env, amount);
        Self::spend_allowance(&env, &from, &spender, amount);
        Self::debit_balance(&env, &from, amount);
    }

    fn decimals(env: Env) -> u32 {
        let meta: TokenMetadata = env.storage().instance().get(&DataKey::Metadata).unwrap();
        meta.decimals
    }

    fn name(env: Env) -> String {
        let meta: TokenMetadata = env.storage().instance().get(&DataKey::Metadata).unwrap();
        meta.name
    }

    fn symbol(env: Env) -> String {
        let meta: TokenMetadata = env.storage().instance().get(&DataKey::Metadata).unwrap();
        meta.symbol
    }
}
