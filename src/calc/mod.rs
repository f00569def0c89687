pub mod calculate_volatility;
