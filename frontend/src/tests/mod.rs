mod symbol_tests;
