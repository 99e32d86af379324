mod stdio_tests;
