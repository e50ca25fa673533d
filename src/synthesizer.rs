pub mod literal;
pub mod test_case;
