pub mod mock_chemistry;
