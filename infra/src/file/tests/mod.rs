mod file_store_tests;
