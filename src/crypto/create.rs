//! CREATE contract address computation.
//!
//! address = keccak256(rlp([sender, nonce]))[12..32]

use rlp::RlpStream;

use super::{keccak256, Address};

/// RLP list `[sender, nonce]` hashed to form the contract address.
#[inline]
fn preimage(sender: &Address, nonce: u64) -> impl AsRef<[u8]> {
    let mut stream = RlpStream::new_list(2);
    stream.append(&sender.as_bytes().as_slice());
    stream.append(&nonce);
    stream.out()
}

/// Computes the address a contract deployed by `sender` with transaction
/// `nonce` will occupy.
#[inline]
pub fn create_address(sender: &Address, nonce: u64) -> Address {
    let hash = keccak256(preimage(sender, nonce).as_ref());
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&hash[12..32]);
    Address::from_bytes(addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        s.parse().unwrap()
    }

    #[test]
    fn test_known_vectors() {
        let sender = addr("6ac7ea33f8831ea9dcc53393aaa88b25a785dbf0");
        assert_eq!(
            create_address(&sender, 0).to_hex(),
            "cd234a471b72ba2f1ccf0a70fcaba648a5eecd8d"
        );
        assert_eq!(
            create_address(&sender, 1).to_hex(),
            "343c43a37d37dff08ae8c4a11544c718abb4fcf8"
        );
        assert_eq!(
            create_address(&sender, 3).to_hex(),
            "fffd933a0bc612844eaf0c6fe3e5b8e9b6c1d19c"
        );
    }

    #[test]
    fn test_multi_byte_nonce() {
        let sender = addr("6ac7ea33f8831ea9dcc53393aaa88b25a785dbf0");
        assert_eq!(
            create_address(&sender, 200).to_hex(),
            "eb7facd118466c9acbcb4ee964a0ac0b0b2ef256"
        );
    }

    #[test]
    fn test_preimage_layout() {
        let sender = addr("6ac7ea33f8831ea9dcc53393aaa88b25a785dbf0");

        let zero = preimage(&sender, 0);
        let zero = zero.as_ref();
        assert_eq!(zero.len(), 23);
        assert_eq!(&zero[..2], &[0xd6, 0x94]);
        assert_eq!(&zero[2..22], sender.as_bytes());
        assert_eq!(zero[22], 0x80);

        let small = preimage(&sender, 0x7f);
        assert_eq!(small.as_ref()[22..], [0x7f]);

        let wide = preimage(&sender, 0x0400);
        assert_eq!(wide.as_ref()[0], 0xd8);
        assert_eq!(wide.as_ref()[22..], [0x82, 0x04, 0x00]);

        let max = preimage(&sender, u64::MAX);
        assert_eq!(max.as_ref().len(), 31);
        assert_eq!(max.as_ref()[22], 0x88);
    }

    #[test]
    fn test_deterministic() {
        let sender = addr("7e5f4552091a69125d5dfcb7b8c2659029395bdf");
        let first = create_address(&sender, 0);
        for _ in 0..8 {
            assert_eq!(create_address(&sender, 0), first);
        }
    }
}
