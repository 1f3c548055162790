//! Wire encoding for routes, consumed by the on-chain aggregator contract's
//! `evaluate`/`aggregate` entry points.
//!
//! Grounded in `pools/model.py` (`SwapHop.serialize`, `SwapRoute.serialize`,
//! `SwapEvaluation.build_tx_payload`) and `utils/convert.py` (`int2hex`,
//! `int2hex_even_size`, `str2hex`, `hex2str`). The on-chain side only ever
//! needs a hop's venue address, type code and output token — not the full
//! `SwapPool` descriptor — so the wire format round-trips through a
//! minimal [`WireRoute`] rather than the full [`crate::types::SwapRoute`].

use num_bigint::BigInt;

use crate::types::{ScType, SwapRoute, VenueAddress};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WireError {
    #[error("truncated route payload")]
    Truncated,
    #[error("invalid utf8 in token identifier")]
    InvalidUtf8,
    #[error("unknown sc_type code: {0}")]
    UnknownScType(u8),
}

/// `str2hex`: ASCII string to lowercase hex.
pub fn str2hex(s: &str) -> String {
    hex::encode(s.as_bytes())
}

/// `hex2str`: inverse of [`str2hex`].
pub fn hex2str(hex_str: &str) -> Result<String, WireError> {
    let bytes = hex::decode(hex_str).map_err(|_| WireError::Truncated)?;
    String::from_utf8(bytes).map_err(|_| WireError::InvalidUtf8)
}

/// `int2hex`: big-endian hex digits, zero-padded to an even length unless
/// `size` is given (in hex digits).
pub fn int2hex(value: &BigInt, size: Option<usize>) -> String {
    let raw = value.to_str_radix(16);
    let target = size.unwrap_or_else(|| if raw.len() % 2 == 0 { raw.len() } else { raw.len() + 1 });
    format!("{:0>width$}", raw, width = target)
}

/// `int2hex_even_size`: like [`int2hex`] but when the natural
/// representation is odd-length, pads on the *right* with a zero nibble
/// (matching the source's `ljust`, an intentional on-chain-ABI quirk kept
/// for wire compatibility rather than "fixed").
pub fn int2hex_even_size(value: &BigInt) -> String {
    let val = int2hex(value, None);
    if val.len() % 2 == 0 {
        val
    } else {
        format!("{:0<width$}", val, width = val.len() + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireHop {
    pub sc_address: VenueAddress,
    pub sc_type: ScType,
    pub token_out: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireRoute {
    pub token_in: String,
    pub hops: Vec<WireHop>,
}

impl WireRoute {
    pub fn from_route(route: &SwapRoute) -> Self {
        Self {
            token_in: route.token_in.clone(),
            hops: route
                .hops
                .iter()
                .map(|h| WireHop {
                    sc_address: h.pool.sc_address,
                    sc_type: h.pool.sc_type,
                    token_out: h.token_out.clone(),
                })
                .collect(),
        }
    }

    /// `u32_be(len(token_in)) || utf8(token_in) || u32_be(len(hops)) || hops*`
    /// with each hop `32-byte addr || u8(type_code) || u32_be(len(token_out)) || utf8(token_out)`.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(self.token_in.len() as u32).to_be_bytes());
        out.extend_from_slice(self.token_in.as_bytes());
        out.extend_from_slice(&(self.hops.len() as u32).to_be_bytes());
        for hop in &self.hops {
            out.extend_from_slice(&hop.sc_address.0);
            out.push(hop.sc_type.code());
            out.extend_from_slice(&(hop.token_out.len() as u32).to_be_bytes());
            out.extend_from_slice(hop.token_out.as_bytes());
        }
        out
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, WireError> {
        let mut cursor = 0usize;
        let token_in = read_len_prefixed_string(bytes, &mut cursor)?;
        let n_hops = read_u32(bytes, &mut cursor)? as usize;

        let mut hops = Vec::with_capacity(n_hops);
        for _ in 0..n_hops {
            if cursor + 32 > bytes.len() {
                return Err(WireError::Truncated);
            }
            let mut addr = [0u8; 32];
            addr.copy_from_slice(&bytes[cursor..cursor + 32]);
            cursor += 32;

            let type_byte = *bytes.get(cursor).ok_or(WireError::Truncated)?;
            cursor += 1;
            let sc_type = sc_type_from_code(type_byte)?;

            let token_out = read_len_prefixed_string(bytes, &mut cursor)?;

            hops.push(WireHop {
                sc_address: VenueAddress(addr),
                sc_type,
                token_out,
            });
        }

        Ok(Self { token_in, hops })
    }

    /// Total serialized length, matching the invariant in §8.9:
    /// `4 + |tok_in| + 4 + Σ(32 + 1 + 4 + |tok_out_k|)`.
    pub fn expected_len(&self) -> usize {
        4 + self.token_in.len()
            + 4
            + self
                .hops
                .iter()
                .map(|h| 32 + 1 + 4 + h.token_out.len())
                .sum::<usize>()
    }
}

fn read_u32(bytes: &[u8], cursor: &mut usize) -> Result<u32, WireError> {
    if *cursor + 4 > bytes.len() {
        return Err(WireError::Truncated);
    }
    let v = u32::from_be_bytes(bytes[*cursor..*cursor + 4].try_into().unwrap());
    *cursor += 4;
    Ok(v)
}

fn read_len_prefixed_string(bytes: &[u8], cursor: &mut usize) -> Result<String, WireError> {
    let len = read_u32(bytes, cursor)? as usize;
    if *cursor + len > bytes.len() {
        return Err(WireError::Truncated);
    }
    let s = std::str::from_utf8(&bytes[*cursor..*cursor + len])
        .map_err(|_| WireError::InvalidUtf8)?
        .to_string();
    *cursor += len;
    Ok(s)
}

fn sc_type_from_code(code: u8) -> Result<ScType, WireError> {
    if code == 0 || code as usize > ScType::ALL.len() {
        return Err(WireError::UnknownScType(code));
    }
    Ok(ScType::ALL[code as usize - 1])
}

/// `amounts_and_routes_payload`: `@`-joined `hex(amount)@hex(route)`
/// segments, `amount` padded to even length.
pub fn amounts_and_routes_payload(legs: &[(BigInt, SwapRoute)]) -> String {
    legs.iter()
        .map(|(amount, route)| {
            let amount_hex = int2hex_even_size(amount);
            let route_hex = hex::encode(WireRoute::from_route(route).serialize());
            format!("{amount_hex}@{route_hex}")
        })
        .collect::<Vec<_>>()
        .join("@")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SwapHop, SwapPool};

    fn sample_route() -> SwapRoute {
        let pool = SwapPool {
            name: "xex-1".into(),
            sc_address: VenueAddress([7u8; 32]),
            tokens_in: vec!["WEGLD-bd4d79".into()],
            tokens_out: vec!["USDC-c76f1f".into()],
            sc_type: ScType::XExchange,
        };
        let hop = SwapHop {
            pool,
            token_in: "WEGLD-bd4d79".into(),
            token_out: "USDC-c76f1f".into(),
        };
        SwapRoute::new("WEGLD-bd4d79", "USDC-c76f1f", vec![hop])
    }

    #[test]
    fn route_round_trips_through_wire_format() {
        let route = sample_route();
        let wire = WireRoute::from_route(&route);
        let bytes = wire.serialize();
        assert_eq!(bytes.len(), wire.expected_len());

        let decoded = WireRoute::deserialize(&bytes).unwrap();
        assert_eq!(decoded, wire);
    }

    #[test]
    fn int2hex_even_size_pads_on_the_right() {
        // 0x1 -> "1" (odd) -> right-padded to "10"
        assert_eq!(int2hex_even_size(&BigInt::from(1)), "10");
        assert_eq!(int2hex_even_size(&BigInt::from(255)), "ff");
    }

    #[test]
    fn str2hex_round_trips() {
        let s = "WEGLD-bd4d79";
        assert_eq!(hex2str(&str2hex(s)).unwrap(), s);
    }
}
