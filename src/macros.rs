// SPDX-License-Identifier: CC0-1.0

/// Defines the key type registry of one map scope.
///
/// Generates an open enum with one variant per known key type plus `Unknown(u8)`, together with
/// the conversions to and from the raw `keytype` byte. `Unknown` is never produced for a listed
/// value.
macro_rules! impl_key_type_registry {
    (
        $(#[$attr:meta])*
        pub enum $name:ident {
            $( $(#[$vattr:meta])* $variant:ident = $value:path, )*
        }
        display = $to_str:path;
    ) => {
        $(#[$attr])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $( $(#[$vattr])* $variant, )*
            /// Any key type not listed above, including proprietary keys.
            Unknown(u8),
        }

        impl $name {
            /// Returns the raw `keytype` byte.
            pub fn type_value(self) -> u8 {
                match self {
                    $( $name::$variant => $value, )*
                    $name::Unknown(v) => v,
                }
            }
        }

        impl From<u8> for $name {
            fn from(v: u8) -> Self {
                match v {
                    $( $value => $name::$variant, )*
                    v => $name::Unknown(v),
                }
            }
        }

        impl From<$name> for u8 {
            fn from(t: $name) -> u8 { t.type_value() }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{} ({:#04x})", $to_str(self.type_value()), self.type_value())
            }
        }
    };
}

/// Sets an at-most-once map field, erroring if it is already set.
macro_rules! v0_insert_once {
    ($slf:ident.$name:ident = $value:expr, $typeval:expr) => {
        if $slf.$name.is_some() {
            return Err($crate::Error::DuplicateKey($crate::raw::Key::unkeyed($typeval)));
        }
        $slf.$name = Some($value);
    };
}

/// Pushes onto a sequence field keyed by public key, erroring on a repeated key.
macro_rules! v0_insert_keyed {
    ($slf:ident.$name:ident <= $value:expr, $typeval:expr) => {
        let value = $value;
        if $slf.$name.iter().any(|existing| existing.pubkey == value.pubkey) {
            return Err($crate::Error::DuplicateKey(value.to_pair($typeval).key));
        }
        $slf.$name.push(value);
    };
}

/// Pushes an unknown pair, erroring on a repeated key.
macro_rules! v0_insert_unknown {
    ($slf:ident.$name:ident <= $pair:expr) => {
        let pair: $crate::raw::Pair = $pair;
        if $slf.$name.iter().any(|existing| existing.key == pair.key) {
            return Err($crate::Error::DuplicateKey(pair.key));
        }
        tracing::trace!(key = %pair.key, "passing through unknown key");
        $slf.$name.push(pair);
    };
}

#[rustfmt::skip]
macro_rules! impl_psbt_get_pair {
    ($rv:ident.push($slf:ident.$unkeyed_name:ident, $unkeyed_typeval:expr)) => {
        if let Some(ref $unkeyed_name) = $slf.$unkeyed_name {
            $rv.push($crate::field::unkeyed_pair($unkeyed_typeval, $unkeyed_name));
        }
    };
    ($rv:ident.push_keyed($slf:ident.$keyed_name:ident, $keyed_typeval:expr)) => {
        for entry in &$slf.$keyed_name {
            $rv.push(entry.to_pair($keyed_typeval));
        }
    };
    ($rv:ident.push_unknown($slf:ident.$unknown_name:ident)) => {
        for pair in &$slf.$unknown_name {
            $rv.push(pair.clone());
        }
    };
}
