#![no_std]
use soroban_sdk::{contract, contracterror, contractimpl, contracttype, log, token, Address, Env};

mod test;

// ─────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────

#[contracterror]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BurnerError {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    NothingToBurn = 3,
}

// ─────────────────────────────────────────────────
// Storage Keys
// ─────────────────────────────────────────────────

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Token,
}

// ─────────────────────────────────────────────────
// Contract
// ─────────────────────────────────────────────────

/// Supply-destruction utility. Tokens routed here sit until someone calls
/// `burn`, which destroys the burner's entire balance in one sweep.
#[contract]
pub struct BurnerContract;

#[contractimpl]
impl BurnerContract {
    /// Bind the burner to the token it destroys. Can only be called once.
    pub fn initialize(env: Env, token: Address) -> Result<(), BurnerError> {
        if env.storage().instance().has(&DataKey::Token) {
            return Err(BurnerError::AlreadyInitialized);
        }
        env.storage().instance().set(&DataKey::Token, &token);
        Ok(())
    }

    fn get_token_addr(env: &Env) -> Result<Address, BurnerError> {
        env.storage()
            .instance()
            .get(&DataKey::Token)
            .ok_or(BurnerError::NotInitialized)
    }

    /// Sweep the burner's own token balance to zero. Open to any caller;
    /// fails when there is nothing to destroy.
    pub fn burn(env: Env, caller: Address) -> Result<i128, BurnerError> {
        caller.require_auth();
        let token_addr = Self::get_token_addr(&env)?;
        let client = token::Client::new(&env, &token_addr);

        let own = env.current_contract_address();
        let balance = client.balance(&own);
        if balance == 0 {
            return Err(BurnerError::NothingToBurn);
        }

        client.burn(&own, &balance);
        log!(&env, "Burned {} tokens", balance);
        Ok(balance)
    }

    pub fn get_token(env: Env) -> Result<Address, BurnerError> {
        Self::get_token_addr(&env)
    }

    pub fn balance(env: Env) -> Result<i128, BurnerError> {
        let token_addr = Self::get_token_addr(&env)?;
        let client = token::Client::new(&env, &token_addr);
        Ok(client.balance(&env.current_contract_address()))
    }
}
