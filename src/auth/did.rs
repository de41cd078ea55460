use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DidError {
    #[error("DID has no ':' separated segments")]
    MissingSeparator,

    #[error("DID has an empty address segment")]
    EmptyAddress,
}

/// Extract the address from a `did:pkh:eip155:<chain-id>:<address>` DID
///
/// Only the position of the last `:` matters; the method and chain-id are not
/// checked.
pub fn get_address_from_did(did: &str) -> Result<&str, DidError> {
    let (_, address) = did.rsplit_once(':').ok_or(DidError::MissingSeparator)?;
    if address.is_empty() {
        return Err(DidError::EmptyAddress);
    }
    Ok(address)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";

    #[test]
    fn test_get_address_from_did() {
        let did = format!("did:pkh:eip155:1:{}", ADDRESS);
        assert_eq!(get_address_from_did(&did), Ok(ADDRESS));
    }

    #[test]
    fn test_get_address_from_did_other_chain() {
        let did = format!("did:pkh:eip155:10:{}", ADDRESS);
        assert_eq!(get_address_from_did(&did), Ok(ADDRESS));
    }

    #[test]
    fn test_get_address_from_did_no_separator() {
        assert_eq!(get_address_from_did("nocolons"), Err(DidError::MissingSeparator));
    }

    #[test]
    fn test_get_address_from_did_empty_address() {
        assert_eq!(
            get_address_from_did("did:pkh:eip155:1:"),
            Err(DidError::EmptyAddress)
        );
    }

    #[test]
    fn test_get_address_from_did_takes_last_segment() {
        assert_eq!(get_address_from_did("did:pkh:eip155:1:0xabc:0xdef"), Ok("0xdef"));
    }
}
