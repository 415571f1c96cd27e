fn main() {
    traj_eval::cli::run();
}
