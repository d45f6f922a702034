mod cpu_tests;
mod ines_tests;
mod mapper_tests;
mod ppu_tests;
