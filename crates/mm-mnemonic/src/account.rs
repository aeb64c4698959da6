//! Account derivation orchestrator: mnemonic + passphrase + template -> ordered accounts.

use crate::{
    chains::{self, ChainOptions, Coin},
    errors::MnemonicToolError,
    mnemonic::MnemonicPhrase,
    path_template::PathTemplate,
};
use eyre::Context as _;
use std::fmt;
use zeroize::Zeroizing;

pub struct DeriveRequest<'a> {
    pub coin: Coin,
    pub mnemonic: &'a str,
    pub passphrase: &'a str,
    /// `None` selects the coin's default template.
    pub template: Option<&'a str>,
    pub limit: u32,
    pub options: ChainOptions,
}

#[derive(Clone, PartialEq, Eq)]
pub struct DerivedAccount {
    pub coin: Coin,
    pub index: u32,
    pub path: String,
    pub address: String,
    pub private_key: Zeroizing<String>,
}

impl fmt::Debug for DerivedAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedAccount")
            .field("coin", &self.coin)
            .field("index", &self.index)
            .field("path", &self.path)
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Parse `template` (or the coin default) and check it suits the coin's curve.
pub fn template_for(coin: Coin, template: Option<&str>) -> Result<PathTemplate, MnemonicToolError> {
    let t = PathTemplate::parse(template.unwrap_or(coin.default_template()))?;
    chains::check_template(coin, &t)?;
    Ok(t)
}

/// Derive accounts `0..limit` in index order.
///
/// The mnemonic and template are validated before the seed is computed, so invalid
/// input never reaches a chain deriver, even when `limit` is zero.
pub fn derive_accounts(req: &DeriveRequest<'_>) -> eyre::Result<Vec<DerivedAccount>> {
    derive_accounts_at(req, 0..req.limit)
}

/// Like [`derive_accounts`] but for an explicit list of indices; `req.limit` is ignored.
pub fn derive_accounts_at(
    req: &DeriveRequest<'_>,
    indices: impl IntoIterator<Item = u32>,
) -> eyre::Result<Vec<DerivedAccount>> {
    let mnemonic = MnemonicPhrase::parse(req.mnemonic)?;
    let template = template_for(req.coin, req.template)?;
    let mut indices = indices.into_iter().peekable();
    if indices.peek().is_none() {
        return Ok(vec![]);
    }

    let seed = mnemonic.to_seed(req.passphrase)?;
    indices
        .map(|index| -> eyre::Result<DerivedAccount> {
            let path = template.resolve(index)?;
            let kp = chains::derive(req.coin, &seed, &path, req.options)
                .with_context(|| format!("derive {} account {index}", req.coin))?;
            Ok(DerivedAccount {
                coin: req.coin,
                index,
                path: path.to_string(),
                address: kp.address,
                private_key: kp.private_key,
            })
        })
        .collect()
}
