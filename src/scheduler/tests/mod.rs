//! Scheduler 单元测试
//!
//! 测试续延、屏障、任务变体、就绪队列和调度循环
