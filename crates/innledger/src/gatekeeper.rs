//! Account registry and authentication decisions.
//!
//! Deliberately minimal: an in-memory map of accounts with SHA-256 password
//! digests, seeded with the protected system accounts. No sessions, no
//! persistence. [`Gatekeeper::verify`] never errors; a failed lookup and a
//! wrong password both come back as the same unauthenticated decision.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use innledger_error::{LedgerError, Result};
use innledger_types::Tenant;

const SYSTEM_ADMIN: &str = "admin";
const DEFAULT_ADMIN_PASSWORD: &str = "admin@12345";

/// What an authenticated account is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Staff,
}

/// Which tenants an account may act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantScope {
    All,
    One(Tenant),
}

impl TenantScope {
    #[must_use]
    pub fn permits(&self, tenant: &Tenant) -> bool {
        match self {
            Self::All => true,
            Self::One(own) => own == tenant,
        }
    }
}

/// Outcome of a credential check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDecision {
    pub authenticated: bool,
    pub role: Option<Role>,
    pub tenant_scope: Option<TenantScope>,
}

impl AccessDecision {
    fn denied() -> Self {
        Self {
            authenticated: false,
            role: None,
            tenant_scope: None,
        }
    }

    /// Authenticated and scoped to cover `tenant`.
    #[must_use]
    pub fn permits(&self, tenant: &Tenant) -> bool {
        self.authenticated
            && self
                .tenant_scope
                .as_ref()
                .is_some_and(|scope| scope.permits(tenant))
    }
}

struct Account {
    digest: String,
    role: Role,
    scope: TenantScope,
    /// System accounts cannot be removed.
    system: bool,
}

/// In-memory account registry.
pub struct Gatekeeper {
    accounts: HashMap<String, Account>,
}

impl Gatekeeper {
    /// An empty registry, no accounts at all.
    #[must_use]
    pub fn new() -> Self {
        Self {
            accounts: HashMap::new(),
        }
    }

    /// The production registry: one protected admin covering every tenant
    /// plus one protected staff account per tenant.
    #[must_use]
    pub fn with_defaults(tenants: &[Tenant]) -> Self {
        let mut gate = Self::new();
        gate.insert_system(
            SYSTEM_ADMIN,
            DEFAULT_ADMIN_PASSWORD,
            Role::Admin,
            TenantScope::All,
        );
        for tenant in tenants {
            gate.insert_system(
                &staff_username(tenant),
                &default_staff_password(tenant),
                Role::Staff,
                TenantScope::One(tenant.clone()),
            );
        }
        gate
    }

    fn insert_system(&mut self, username: &str, password: &str, role: Role, scope: TenantScope) {
        self.accounts.insert(
            username.to_owned(),
            Account {
                digest: sha256_hex(password.as_bytes()),
                role,
                scope,
                system: true,
            },
        );
    }

    /// Check credentials. Unknown usernames and wrong passwords both yield
    /// an unauthenticated decision; this path never errors.
    #[must_use]
    pub fn verify(&self, username: &str, password: &str) -> AccessDecision {
        let Some(account) = self.accounts.get(username) else {
            return AccessDecision::denied();
        };
        if account.digest != sha256_hex(password.as_bytes()) {
            return AccessDecision::denied();
        }
        AccessDecision {
            authenticated: true,
            role: Some(account.role),
            tenant_scope: Some(account.scope.clone()),
        }
    }

    /// Add an account. Empty usernames and duplicates are refused.
    pub fn register(
        &mut self,
        username: &str,
        password: &str,
        role: Role,
        scope: TenantScope,
    ) -> Result<()> {
        if username.trim().is_empty() {
            return Err(LedgerError::AccountRefused {
                username: username.to_owned(),
                reason: "username must not be empty",
            });
        }
        if self.accounts.contains_key(username) {
            return Err(LedgerError::AccountRefused {
                username: username.to_owned(),
                reason: "username already exists",
            });
        }
        self.accounts.insert(
            username.to_owned(),
            Account {
                digest: sha256_hex(password.as_bytes()),
                role,
                scope,
                system: false,
            },
        );
        Ok(())
    }

    /// Remove an account. System accounts and unknown usernames are refused.
    pub fn remove(&mut self, username: &str) -> Result<()> {
        match self.accounts.get(username) {
            None => Err(LedgerError::AccountRefused {
                username: username.to_owned(),
                reason: "unknown account",
            }),
            Some(account) if account.system => Err(LedgerError::AccountRefused {
                username: username.to_owned(),
                reason: "system accounts cannot be removed",
            }),
            Some(_) => {
                self.accounts.remove(username);
                Ok(())
            }
        }
    }

    #[must_use]
    pub fn contains(&self, username: &str) -> bool {
        self.accounts.contains_key(username)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl Default for Gatekeeper {
    fn default() -> Self {
        Self::new()
    }
}

fn staff_username(tenant: &Tenant) -> String {
    format!("{tenant}_staff")
}

fn default_staff_password(tenant: &Tenant) -> String {
    format!("{tenant}@staff")
}

fn sha256_hex(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";

    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let high = usize::from(byte >> 4);
        let low = usize::from(byte & 0x0F);
        out.push(char::from(HEX[high]));
        out.push(char::from(HEX[low]));
    }
    out
}
