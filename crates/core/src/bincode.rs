use bincode::config;

pub const STANDARD_LIMIT_16M: usize = 0x100_0000;

/// The one encoding used for everything that ends up in consensus state
pub const STD_BINCODE_CONFIG: config::Configuration<
    config::BigEndian,
    config::Varint,
    config::Limit<STANDARD_LIMIT_16M>,
> = config::standard()
    .with_limit::<STANDARD_LIMIT_16M>()
    .with_big_endian()
    .with_variable_int_encoding();
