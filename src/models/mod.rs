pub mod parser_options;
